use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::errors::CaptureError;
use crate::core::models::SlotId;
use crate::global_constants::LOG_TAG_REGISTRY;

/// A capture whose artifact has appeared on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCapture {
    pub slot_id: SlotId,
    pub path: PathBuf,
    pub file_size_bytes: Option<u64>,
}

/// Tracks which slots have a pending (not-yet-completed) capture and the
/// artifact path each is waiting on. A slot is busy iff it has an entry.
///
/// Entries leave the registry through `resolve` when the artifact appears,
/// through `force_clear` when a snapshot worker gives up, or through `clear`
/// at shutdown.
#[derive(Default)]
pub struct BusyRegistry {
    pending: HashMap<SlotId, PathBuf>,
}

impl BusyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_busy(&mut self, slot_id: SlotId, path: PathBuf) -> Result<(), CaptureError> {
        if self.pending.contains_key(&slot_id) {
            return Err(CaptureError::AlreadyBusy(slot_id));
        }

        log::debug!("{} slot {} pending -> {:?}", LOG_TAG_REGISTRY, slot_id, path);
        self.pending.insert(slot_id, path);
        Ok(())
    }

    pub fn is_busy(&self, slot_id: SlotId) -> bool {
        self.pending.contains_key(&slot_id)
    }

    pub fn pending_path(&self, slot_id: SlotId) -> Option<&Path> {
        self.pending.get(&slot_id).map(PathBuf::as_path)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Checks each pending artifact against the filesystem and removes the
    /// entries whose file now exists, returning them with the artifact size
    /// for diagnostics.
    pub fn resolve(&mut self) -> Vec<ResolvedCapture> {
        let completed: Vec<SlotId> = self
            .pending
            .iter()
            .filter(|(_, path)| path.exists())
            .map(|(slot_id, _)| *slot_id)
            .collect();

        completed
            .into_iter()
            .filter_map(|slot_id| {
                let path = self.pending.remove(&slot_id)?;
                let file_size_bytes = std::fs::metadata(&path).map(|m| m.len()).ok();

                log::debug!(
                    "{} slot {} resolved ({:?}, {:?} bytes)",
                    LOG_TAG_REGISTRY,
                    slot_id,
                    path,
                    file_size_bytes
                );

                Some(ResolvedCapture {
                    slot_id,
                    path,
                    file_size_bytes,
                })
            })
            .collect()
    }

    /// Drops a pending entry without waiting for the artifact. Used when the
    /// snapshot worker exhausts its retries.
    pub fn force_clear(&mut self, slot_id: SlotId) -> Option<PathBuf> {
        let removed = self.pending.remove(&slot_id);
        if let Some(path) = &removed {
            log::warn!(
                "{} slot {} force-cleared, abandoning {:?}",
                LOG_TAG_REGISTRY,
                slot_id,
                path
            );
        }
        removed
    }

    /// Drops all entries. Shutdown only.
    pub fn clear(&mut self) {
        if !self.pending.is_empty() {
            log::info!(
                "{} clearing {} pending capture(s)",
                LOG_TAG_REGISTRY,
                self.pending.len()
            );
        }
        self.pending.clear();
    }
}
