mod app;
mod core;
mod global_constants;
mod ports;
mod user_settings;

#[cfg(test)]
mod capture_scheduler_tests;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    log::info!(
        "{} starting {}",
        global_constants::LOG_TAG_MAIN,
        global_constants::APPLICATION_NAME
    );

    println!("{}", global_constants::STARTUP_BANNER);

    let mut snapshot_app = app::SnapshotApp::build();
    snapshot_app.run().await
}
