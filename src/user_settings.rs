use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::global_constants;

fn default_pool_size() -> usize {
    global_constants::DEFAULT_POOL_SIZE
}

fn default_tick_interval_ms() -> u64 {
    global_constants::DEFAULT_TICK_INTERVAL_MS
}

fn default_snapshot_poll_interval_ms() -> u64 {
    global_constants::DEFAULT_SNAPSHOT_POLL_INTERVAL_MS
}

fn default_snapshot_max_attempts() -> u32 {
    global_constants::DEFAULT_SNAPSHOT_MAX_ATTEMPTS
}

fn default_media_duration_secs() -> u64 {
    global_constants::DEFAULT_MEDIA_DURATION_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    /// Path prefix for snapshot artifacts; the timestamp and extension are
    /// appended. Captures fail until this is set.
    #[serde(default)]
    pub output_prefix: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_snapshot_poll_interval_ms")]
    pub snapshot_poll_interval_ms: u64,
    #[serde(default = "default_snapshot_max_attempts")]
    pub snapshot_max_attempts: u32,
    /// Duration the demo clock player pretends loaded media has.
    #[serde(default = "default_media_duration_secs")]
    pub media_duration_secs: u64,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            output_prefix: String::new(),
            pool_size: default_pool_size(),
            tick_interval_ms: default_tick_interval_ms(),
            snapshot_poll_interval_ms: default_snapshot_poll_interval_ms(),
            snapshot_max_attempts: default_snapshot_max_attempts(),
            media_duration_secs: default_media_duration_secs(),
        }
    }
}

impl UserSettings {
    pub fn load() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_file_path()?;

        if !settings_path.exists() {
            log::info!(
                "{} no settings file found, using defaults",
                global_constants::LOG_TAG_SETTINGS
            );
            let default_settings = Self::default();
            default_settings.save()?;
            return Ok(default_settings);
        }

        let contents = std::fs::read_to_string(&settings_path)?;
        let settings: UserSettings = serde_json::from_str(&contents)?;

        log::info!(
            "{} loaded settings from {:?}",
            global_constants::LOG_TAG_SETTINGS,
            settings_path
        );
        log::debug!(
            "{} output prefix: {:?}, pool size: {}",
            global_constants::LOG_TAG_SETTINGS,
            settings.output_prefix,
            settings.pool_size
        );

        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let settings_path = Self::get_settings_file_path()?;

        if let Some(parent) = settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&settings_path, contents)?;

        log::info!(
            "{} saved settings to {:?}",
            global_constants::LOG_TAG_SETTINGS,
            settings_path
        );
        Ok(())
    }

    fn get_settings_file_path() -> anyhow::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join(global_constants::CONFIG_DIR_NAME);

        Ok(config_dir.join(global_constants::SETTINGS_FILE_NAME))
    }
}
