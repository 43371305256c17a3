use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::{Rgb, RgbImage};

use crate::core::interfaces::ports::PlayerHandle;
use crate::global_constants::LOG_TAG_PLAYER;

const FRAME_STEP_SECS: f64 = 1.0 / 25.0;
const SNAPSHOT_RENDER_DELAY_MS: u64 = 400;
const SNAPSHOT_WIDTH: u32 = 320;
const SNAPSHOT_HEIGHT: u32 = 180;

struct ClockState {
    playing: bool,
    rate: f32,
    anchor_position_secs: f64,
    resumed_at: Option<Instant>,
    duration: Duration,
}

/// A stand-in player that models playback against a monotonic clock instead
/// of decoding real media, and renders a small solid-color PNG for each
/// snapshot request.
///
/// Snapshots reproduce the real engine's contract: the request returns
/// immediately and the file appears on disk only after an artificial render
/// delay, with no completion signal.
pub struct ClockPlayerHandle {
    state: Mutex<ClockState>,
    media_path: Mutex<Option<PathBuf>>,
}

impl ClockPlayerHandle {
    pub fn initialize(duration: Duration) -> Self {
        log::debug!(
            "{} initializing clock player, duration {:?}",
            LOG_TAG_PLAYER,
            duration
        );

        Self {
            state: Mutex::new(ClockState {
                playing: false,
                rate: 1.0,
                anchor_position_secs: 0.0,
                resumed_at: None,
                duration,
            }),
            media_path: Mutex::new(None),
        }
    }

    /// Points this player at a media file and rewinds to the start. The file
    /// is never decoded; it only anchors what "the loaded video" means.
    pub fn load_media(&self, path: &Path) -> Result<()> {
        let mut media_path = self
            .media_path
            .lock()
            .map_err(|_| anyhow::anyhow!("player media state poisoned"))?;
        *media_path = Some(path.to_path_buf());

        let mut state = self.lock_state()?;
        state.playing = false;
        state.anchor_position_secs = 0.0;
        state.resumed_at = None;

        log::info!("{} loaded media {:?}", LOG_TAG_PLAYER, path);
        Ok(())
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, ClockState>> {
        self.state
            .lock()
            .map_err(|_| anyhow::anyhow!("player clock state poisoned"))
    }

    fn current_secs(state: &ClockState) -> f64 {
        let elapsed = state
            .resumed_at
            .map(|resumed_at| resumed_at.elapsed().as_secs_f64() * state.rate as f64)
            .unwrap_or(0.0);
        let total = state.anchor_position_secs + elapsed;
        total.clamp(0.0, state.duration.as_secs_f64())
    }

    fn freeze_position(state: &mut ClockState) {
        state.anchor_position_secs = Self::current_secs(state);
        state.resumed_at = None;
    }
}

#[async_trait]
impl PlayerHandle for ClockPlayerHandle {
    fn play(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        if !state.playing {
            state.playing = true;
            state.resumed_at = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        if state.playing {
            Self::freeze_position(&mut state);
            state.playing = false;
        }
        Ok(())
    }

    fn is_playing(&self) -> Result<bool> {
        Ok(self.lock_state()?.playing)
    }

    fn get_position(&self) -> Result<f64> {
        let state = self.lock_state()?;
        let duration_secs = state.duration.as_secs_f64();
        if duration_secs <= 0.0 {
            return Ok(0.0);
        }
        Ok((Self::current_secs(&state) / duration_secs).clamp(0.0, 1.0))
    }

    fn set_position(&self, normalized: f64) -> Result<()> {
        let mut state = self.lock_state()?;
        let duration_secs = state.duration.as_secs_f64();
        state.anchor_position_secs = normalized.clamp(0.0, 1.0) * duration_secs;
        if state.playing {
            state.resumed_at = Some(Instant::now());
        }
        Ok(())
    }

    fn get_rate(&self) -> Result<f32> {
        Ok(self.lock_state()?.rate)
    }

    fn set_rate(&self, rate: f32) -> Result<()> {
        let mut state = self.lock_state()?;
        // Re-anchor so already-elapsed time keeps the old rate.
        Self::freeze_position(&mut state);
        if state.playing {
            state.resumed_at = Some(Instant::now());
        }
        state.rate = rate.max(0.0);
        Ok(())
    }

    fn step_frame(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        Self::freeze_position(&mut state);
        state.playing = false;
        let duration_secs = state.duration.as_secs_f64();
        state.anchor_position_secs =
            (state.anchor_position_secs + FRAME_STEP_SECS).min(duration_secs);
        Ok(())
    }

    fn get_duration(&self) -> Result<Duration> {
        Ok(self.lock_state()?.duration)
    }

    async fn request_snapshot(&self, path: &Path) -> Result<()> {
        let normalized = self.get_position()?;
        let target = path.to_path_buf();

        // The file appears later; failures inside the render task are only
        // logged, matching the fire-and-forget snapshot primitive.
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(SNAPSHOT_RENDER_DELAY_MS)).await;
            if target.exists() {
                return;
            }
            if let Err(error) = render_placeholder_frame(&target, normalized) {
                log::warn!(
                    "{} failed to render snapshot {:?}: {:#}",
                    LOG_TAG_PLAYER,
                    target,
                    error
                );
            }
        });

        Ok(())
    }
}

/// A solid frame whose color tracks the playback position, so artifacts from
/// different scrub points are visually distinguishable.
fn render_placeholder_frame(path: &Path, normalized_position: f64) -> Result<()> {
    let shade = (normalized_position.clamp(0.0, 1.0) * 255.0) as u8;
    let frame = RgbImage::from_pixel(
        SNAPSHOT_WIDTH,
        SNAPSHOT_HEIGHT,
        Rgb([shade, 64, 255 - shade]),
    );

    frame
        .save(path)
        .with_context(|| format!("failed to write snapshot to {:?}", path))
}
