#![allow(dead_code)]

pub const APPLICATION_NAME: &str = "Video Snapshot - Desktop";
pub const APPLICATION_TITLE: &str = "Video Snapshot";

pub const LOG_TAG_MAIN: &str = "[MAIN]";
pub const LOG_TAG_APP: &str = "[APP]";
pub const LOG_TAG_POOL: &str = "[POOL]";
pub const LOG_TAG_REGISTRY: &str = "[REGISTRY]";
pub const LOG_TAG_SCHEDULER: &str = "[SCHEDULER]";
pub const LOG_TAG_REAPER: &str = "[REAPER]";
pub const LOG_TAG_WORKER: &str = "[WORKER]";
pub const LOG_TAG_PLAYER: &str = "[PLAYER]";
pub const LOG_TAG_SETTINGS: &str = "[SETTINGS]";

pub const DEFAULT_POOL_SIZE: usize = 3;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;
pub const DEFAULT_SNAPSHOT_POLL_INTERVAL_MS: u64 = 250;
pub const DEFAULT_SNAPSHOT_MAX_ATTEMPTS: u32 = 40;
pub const DEFAULT_MEDIA_DURATION_SECS: u64 = 60;

pub const SNAPSHOT_FILE_EXTENSION: &str = "png";

pub const RATE_STEP_FACTOR: f32 = 1.1;
pub const JUMP_SECONDS: f64 = 5.0;

pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const CONFIG_DIR_NAME: &str = "video-snapshot-pc";

pub const STARTUP_BANNER: &str = r#"
╔════════════════════════════════════════════════════════╗
║  Video Snapshot - Desktop                              ║
║                                                        ║
║  open <file>   load a video into every player slot     ║
║  prefix <path> set the output prefix for snapshots     ║
║  play / pause  toggle playback on the current slot     ║
║  seek <0..1>   jump to a normalized position           ║
║  rate <f>      playback rate (+ / - step by 1.1)       ║
║  step          advance a single frame                  ║
║  snap          capture a still frame to disk           ║
║  rotate        switch to the next free player slot     ║
║  status        show Ready/Busy and pending captures    ║
║  quit          exit                                    ║
╚════════════════════════════════════════════════════════╝
"#;
