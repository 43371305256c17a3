use std::path::PathBuf;

use crate::core::models::SlotId;

/// Failures surfaced by the capture scheduler. Anything the player itself
/// reports propagates unmodified through the `Player` variant.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("no output prefix configured")]
    EmptyTarget,

    #[error("slot {0} already has a pending capture")]
    AlreadyBusy(SlotId),

    #[error("snapshot {path} did not appear after {attempts} attempts")]
    CaptureTimeout { path: PathBuf, attempts: u32 },

    #[error(transparent)]
    Player(#[from] anyhow::Error),
}
