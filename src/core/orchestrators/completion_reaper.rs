use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::core::errors::CaptureError;
use crate::core::models::{
    BusyRegistry, PlayerSlot, ResolvedCapture, RotatingPool, SchedulerStatus, SlotId,
};
use crate::core::orchestrators::capture_scheduler::rotate_to_next_free;
use crate::global_constants::LOG_TAG_REAPER;

/// The one message a snapshot worker may send back into the scheduling
/// domain: its retry bound elapsed without the artifact appearing.
#[derive(Debug)]
pub enum WorkerEvent {
    SnapshotTimedOut {
        slot_id: SlotId,
        path: PathBuf,
        attempts: u32,
    },
}

/// A capture abandoned because its worker exhausted the retry bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedOutCapture {
    pub slot_id: SlotId,
    pub path: PathBuf,
    pub attempts: u32,
}

impl TimedOutCapture {
    pub fn as_error(&self) -> CaptureError {
        CaptureError::CaptureTimeout {
            path: self.path.clone(),
            attempts: self.attempts,
        }
    }
}

/// What one reconciliation pass observed and did.
#[derive(Debug)]
pub struct TickReport {
    pub resolved: Vec<ResolvedCapture>,
    pub timed_out: Vec<TimedOutCapture>,
    /// The current slot was busy and the reaper rotated away from it.
    pub forced_rotation: bool,
    /// Live position of the current slot after it just became free; the
    /// shell applies this to its displayed scrub position.
    pub resynced_position: Option<f64>,
    pub status: SchedulerStatus,
}

/// Periodic reconciliation of busy state against filesystem reality.
///
/// Captures complete without any signal, so the reaper polls each pending
/// artifact path once per tick. It is the sole mutator of the registry in
/// response to completion: workers never clear their own busy entries.
pub struct CompletionReaper {
    worker_events: mpsc::UnboundedReceiver<WorkerEvent>,
}

impl CompletionReaper {
    pub fn build() -> (Self, mpsc::UnboundedSender<WorkerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                worker_events: receiver,
            },
            sender,
        )
    }

    pub fn reap(
        &mut self,
        pool: &mut RotatingPool<PlayerSlot>,
        registry: &mut BusyRegistry,
    ) -> Result<TickReport, CaptureError> {
        let timed_out = self.apply_worker_timeouts(registry);

        let current_id = pool.current().map(|slot| slot.id);
        let mut resynced_position = None;
        let mut resolved = Vec::new();

        for capture in registry.resolve() {
            log::info!(
                "{} slot {} finished {:?} ({} bytes)",
                LOG_TAG_REAPER,
                capture.slot_id,
                capture.path,
                capture.file_size_bytes.unwrap_or(0)
            );

            // The current slot just became free; re-read its live position so
            // the shell can correct any drift accumulated while it was busy.
            if Some(capture.slot_id) == current_id {
                if let Some(slot) = pool.current() {
                    resynced_position = Some(slot.handle.get_position()?);
                }
            }

            resolved.push(capture);
        }

        // The current slot can become busy after activation (the user
        // re-triggered capture immediately); move off it.
        let mut forced_rotation = false;
        let current_still_busy = pool
            .current()
            .map(|slot| registry.is_busy(slot.id))
            .unwrap_or(false);
        if current_still_busy {
            forced_rotation = rotate_to_next_free(pool, registry)?;
        }

        let status = match pool.current() {
            Some(slot) if registry.is_busy(slot.id) => SchedulerStatus::Busy,
            _ => SchedulerStatus::Ready,
        };

        Ok(TickReport {
            resolved,
            timed_out,
            forced_rotation,
            resynced_position,
            status,
        })
    }

    fn apply_worker_timeouts(&mut self, registry: &mut BusyRegistry) -> Vec<TimedOutCapture> {
        let mut timed_out = Vec::new();

        while let Ok(event) = self.worker_events.try_recv() {
            match event {
                WorkerEvent::SnapshotTimedOut {
                    slot_id,
                    path,
                    attempts,
                } => {
                    // The artifact may have appeared between the worker's last
                    // check and this tick; let resolve() handle that case.
                    if path.exists() {
                        continue;
                    }

                    if registry.pending_path(slot_id) == Some(path.as_path()) {
                        registry.force_clear(slot_id);
                        log::warn!(
                            "{} capture on slot {} timed out after {} attempts ({:?})",
                            LOG_TAG_REAPER,
                            slot_id,
                            attempts,
                            path
                        );
                        timed_out.push(TimedOutCapture {
                            slot_id,
                            path,
                            attempts,
                        });
                    }
                }
            }
        }

        timed_out
    }
}
