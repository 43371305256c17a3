use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::core::interfaces::ports::PlayerHandle;
use crate::core::models::SchedulerStatus;
use crate::core::orchestrators::{CaptureScheduler, SnapshotRetryPolicy};
use crate::global_constants::{JUMP_SECONDS, LOG_TAG_APP, RATE_STEP_FACTOR};
use crate::ports::ClockPlayerHandle;
use crate::user_settings::UserSettings;

/// Line-command shell around the capture scheduler. Owns the scheduling
/// domain: every pool/registry mutation happens inside this loop, either
/// from a typed command or from the fixed-period reaper tick.
pub struct SnapshotApp {
    scheduler: CaptureScheduler,
    players: Vec<Arc<ClockPlayerHandle>>,
    settings: UserSettings,
    displayed_position: f64,
    last_status: SchedulerStatus,
}

impl SnapshotApp {
    pub fn build() -> Self {
        log::info!("{} initializing application", LOG_TAG_APP);

        let settings = UserSettings::load().unwrap_or_else(|error| {
            log::warn!(
                "{} failed to load settings: {}, using defaults",
                LOG_TAG_APP,
                error
            );
            UserSettings::default()
        });

        let pool_size = settings.pool_size.max(1);
        let media_duration = Duration::from_secs(settings.media_duration_secs);

        let players: Vec<Arc<ClockPlayerHandle>> = (0..pool_size)
            .map(|_| Arc::new(ClockPlayerHandle::initialize(media_duration)))
            .collect();

        let handles: Vec<Arc<dyn PlayerHandle>> = players
            .iter()
            .map(|player| Arc::clone(player) as Arc<dyn PlayerHandle>)
            .collect();

        let retry_policy = SnapshotRetryPolicy {
            poll_interval: Duration::from_millis(settings.snapshot_poll_interval_ms),
            max_attempts: settings.snapshot_max_attempts,
        };

        let scheduler =
            CaptureScheduler::build(handles, settings.output_prefix.clone(), retry_policy);

        Self {
            scheduler,
            players,
            settings,
            displayed_position: 0.0,
            last_status: SchedulerStatus::Ready,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tick =
            tokio::time::interval(Duration::from_millis(self.settings.tick_interval_ms.max(1)));
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.handle_tick();
                }
                line = lines.next_line() => {
                    match line? {
                        None => break,
                        Some(line) => {
                            if !self.handle_command(line.trim()) {
                                break;
                            }
                        }
                    }
                }
            }
        }

        log::info!("{} shutting down", LOG_TAG_APP);
        self.scheduler.shutdown();
        Ok(())
    }

    fn handle_tick(&mut self) {
        let report = match self.scheduler.tick() {
            Ok(report) => report,
            Err(error) => {
                log::error!("{} tick failed: {}", LOG_TAG_APP, error);
                return;
            }
        };

        for capture in &report.resolved {
            println!(
                "[SAVED] {:?} ({} bytes)",
                capture.path,
                capture.file_size_bytes.unwrap_or(0)
            );
        }

        for timeout in &report.timed_out {
            println!("[FAILED] {}", timeout.as_error());
        }

        if let Some(position) = report.resynced_position {
            self.displayed_position = position;
        } else if let Some(handle) = self.scheduler.current_handle() {
            if let Ok(position) = handle.get_position() {
                self.displayed_position = position;
            }
        }

        if report.status != self.last_status {
            println!("[STATUS] {}", report.status);
            self.last_status = report.status;
        }
    }

    /// Returns false when the shell should exit.
    fn handle_command(&mut self, line: &str) -> bool {
        let mut parts = line.splitn(2, ' ');
        let command = parts.next().unwrap_or("");
        let argument = parts.next().map(str::trim).unwrap_or("");

        let outcome = match command {
            "" => Ok(()),
            "open" => self.handle_open(argument),
            "prefix" => self.handle_prefix(argument),
            "play" => self.with_current_handle(|handle| handle.play()),
            "pause" => self.with_current_handle(|handle| handle.pause()),
            "seek" => self.handle_seek(argument),
            "rate" => self.handle_rate(argument),
            "step" => self.with_current_handle(|handle| handle.step_frame()),
            "fwd" => self.handle_jump(JUMP_SECONDS),
            "back" => self.handle_jump(-JUMP_SECONDS),
            "snap" => self.handle_snap(),
            "rotate" => self.handle_rotate(),
            "status" => self.handle_status(),
            "quit" | "exit" => return false,
            other => {
                println!("[ERROR] unknown command: {}", other);
                Ok(())
            }
        };

        if let Err(error) = outcome {
            println!("[ERROR] {:#}", error);
        }

        true
    }

    fn handle_open(&mut self, argument: &str) -> Result<()> {
        if argument.is_empty() {
            anyhow::bail!("usage: open <file>");
        }

        let path = Path::new(argument);
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("failed to read metadata of {:?}", path))?;
        let modified = metadata
            .modified()
            .context("filesystem does not report modification times")?;
        let source_created = DateTime::<Local>::from(modified).naive_local();

        self.scheduler.set_source_created(source_created);

        for player in &self.players {
            player.load_media(path)?;
        }

        if let Some(handle) = self.scheduler.current_handle() {
            handle.play()?;
        }

        println!("[OPENED] {:?} (created {})", path, source_created);
        Ok(())
    }

    fn handle_prefix(&mut self, argument: &str) -> Result<()> {
        if argument.is_empty() {
            anyhow::bail!("usage: prefix <path prefix>");
        }

        self.settings.output_prefix = argument.to_string();
        self.scheduler.set_output_prefix(argument);
        if let Err(error) = self.settings.save() {
            log::warn!("{} failed to persist settings: {}", LOG_TAG_APP, error);
        }

        println!("[PREFIX] {}", argument);
        Ok(())
    }

    fn handle_seek(&mut self, argument: &str) -> Result<()> {
        let normalized: f64 = argument
            .parse()
            .context("usage: seek <position between 0 and 1>")?;
        let normalized = normalized.clamp(0.0, 1.0);

        self.with_current_handle(|handle| handle.set_position(normalized))?;
        self.displayed_position = normalized;
        Ok(())
    }

    fn handle_rate(&mut self, argument: &str) -> Result<()> {
        self.with_current_handle(|handle| {
            let new_rate = match argument {
                "+" => handle.get_rate()? * RATE_STEP_FACTOR,
                "-" => handle.get_rate()? / RATE_STEP_FACTOR,
                value => value
                    .parse::<f32>()
                    .context("usage: rate <factor>, rate + or rate -")?,
            };
            handle.set_rate(new_rate)?;
            println!("[RATE] {:.2}", new_rate);
            Ok(())
        })
    }

    fn handle_jump(&mut self, seconds: f64) -> Result<()> {
        let target = self.with_current_handle(|handle| {
            let duration_secs = handle.get_duration()?.as_secs_f64();
            if duration_secs <= 0.0 {
                return Ok(0.0);
            }
            let target = (handle.get_position()? + seconds / duration_secs).clamp(0.0, 1.0);
            handle.set_position(target)?;
            Ok(target)
        })?;
        self.displayed_position = target;
        Ok(())
    }

    fn handle_snap(&mut self) -> Result<()> {
        let path = self.scheduler.capture()?;
        println!("[CAPTURE] -> {:?}", path);
        Ok(())
    }

    fn handle_rotate(&mut self) -> Result<()> {
        let moved = self.scheduler.rotate()?;
        println!(
            "[ROTATE] {}",
            if moved {
                "switched to next free slot"
            } else {
                "no free slot to switch to"
            }
        );
        Ok(())
    }

    fn handle_status(&mut self) -> Result<()> {
        let current = self
            .scheduler
            .current_slot_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "[STATUS] {} | slot {} of {} | pending captures: {} | position: {:.3}",
            self.scheduler.status(),
            current,
            self.scheduler.pool_size(),
            self.scheduler.pending_captures(),
            self.displayed_position
        );
        Ok(())
    }

    fn with_current_handle<T>(
        &self,
        operation: impl FnOnce(&Arc<dyn PlayerHandle>) -> Result<T>,
    ) -> Result<T> {
        let handle = self
            .scheduler
            .current_handle()
            .ok_or_else(|| anyhow::anyhow!("no player slots available"))?;
        operation(&handle)
    }
}
