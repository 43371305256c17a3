use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, NaiveDateTime, TimeDelta, Timelike};

use crate::global_constants::SNAPSHOT_FILE_EXTENSION;

/// The rendered-time instant a capture belongs to: the source file's creation
/// timestamp plus the playback offset. Drives artifact naming, so the same
/// scrub position always yields the same file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CaptureStamp(NaiveDateTime);

impl CaptureStamp {
    pub fn new(instant: NaiveDateTime) -> Self {
        Self(instant)
    }

    pub fn from_playback(source_created: NaiveDateTime, playback_offset: Duration) -> Self {
        let offset_millis = playback_offset.as_millis().min(i64::MAX as u128) as i64;
        Self(source_created + TimeDelta::milliseconds(offset_millis))
    }

    pub fn advance_millis(self, millis: i64) -> Self {
        Self(self.0 + TimeDelta::milliseconds(millis))
    }

    /// Fixed-width, lexicographically sortable stamp: `YY-MM-DD HH-MM-SS-mmm`.
    pub fn format_sortable(&self) -> String {
        let millis = (self.0.nanosecond() / 1_000_000).min(999);
        format!(
            "{:02}-{:02}-{:02} {:02}-{:02}-{:02}-{:03}",
            self.0.year().rem_euclid(100),
            self.0.month(),
            self.0.day(),
            self.0.hour(),
            self.0.minute(),
            self.0.second(),
            millis
        )
    }

    /// Artifact naming convention: `"{prefix} {YY-MM-DD} {HH-MM-SS-mmm}.png"`.
    pub fn artifact_path(&self, prefix: &str) -> PathBuf {
        PathBuf::from(format!(
            "{} {}.{}",
            prefix,
            self.format_sortable(),
            SNAPSHOT_FILE_EXTENSION
        ))
    }
}

/// Advances the stamp one millisecond at a time until the derived artifact
/// path does not exist yet. Collisions only happen for captures landing in
/// the same rendered millisecond, so the walk terminates quickly.
pub fn find_unused_artifact_path(prefix: &str, stamp: CaptureStamp) -> (PathBuf, CaptureStamp) {
    let mut candidate_stamp = stamp;

    loop {
        let candidate_path = candidate_stamp.artifact_path(prefix);
        if !candidate_path.exists() {
            return (candidate_path, candidate_stamp);
        }
        candidate_stamp = candidate_stamp.advance_millis(1);
    }
}
