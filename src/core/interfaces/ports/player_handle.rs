use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

/// Capability contract for one player/capture resource.
///
/// Positions are normalized to `[0, 1)` of the media duration. The snapshot
/// primitive gives no completion signal: `request_snapshot` returns once the
/// request is issued, and the only evidence of completion is the file
/// appearing at `path` some time later. Implementations must tolerate the
/// scheduler re-issuing the request for the same path.
#[async_trait]
pub trait PlayerHandle: Send + Sync {
    fn play(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    fn is_playing(&self) -> Result<bool>;

    fn get_position(&self) -> Result<f64>;

    fn set_position(&self, normalized: f64) -> Result<()>;

    fn get_rate(&self) -> Result<f32>;

    fn set_rate(&self, rate: f32) -> Result<()>;

    fn step_frame(&self) -> Result<()>;

    fn get_duration(&self) -> Result<Duration>;

    async fn request_snapshot(&self, path: &Path) -> Result<()>;
}
