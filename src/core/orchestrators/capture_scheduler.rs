use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::mpsc;

use crate::core::errors::CaptureError;
use crate::core::interfaces::ports::PlayerHandle;
use crate::core::models::{
    find_unused_artifact_path, BusyRegistry, CaptureStamp, PlayerSlot, ResumeState, RotatingPool,
    SchedulerStatus, SlotId,
};
use crate::core::orchestrators::completion_reaper::{CompletionReaper, TickReport, WorkerEvent};
use crate::global_constants::{
    DEFAULT_SNAPSHOT_MAX_ATTEMPTS, DEFAULT_SNAPSHOT_POLL_INTERVAL_MS, LOG_TAG_SCHEDULER,
    LOG_TAG_WORKER,
};

/// Bounds for the background snapshot retry loop. The underlying capture
/// primitive would otherwise be retried forever on persistent failure.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotRetryPolicy {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for SnapshotRetryPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_SNAPSHOT_POLL_INTERVAL_MS),
            max_attempts: DEFAULT_SNAPSHOT_MAX_ATTEMPTS,
        }
    }
}

/// Orchestrates the capture-resource pool: issues captures on the current
/// slot, tracks pending artifacts, and rotates the pool so the user always
/// faces a free, responsive player while captures finish in the background.
///
/// All pool and registry mutation happens through this type on the caller's
/// thread; background snapshot workers only touch the filesystem and the
/// timeout event channel.
pub struct CaptureScheduler {
    pool: RotatingPool<PlayerSlot>,
    registry: BusyRegistry,
    reaper: CompletionReaper,
    worker_events: mpsc::UnboundedSender<WorkerEvent>,
    output_prefix: String,
    source_created: NaiveDateTime,
    retry_policy: SnapshotRetryPolicy,
}

impl CaptureScheduler {
    pub fn build(
        handles: Vec<Arc<dyn PlayerHandle>>,
        output_prefix: String,
        retry_policy: SnapshotRetryPolicy,
    ) -> Self {
        let slots: Vec<PlayerSlot> = handles.into_iter().map(PlayerSlot::wrap).collect();
        let mut pool = RotatingPool::from_items(slots);
        if let Some(first) = pool.current_mut() {
            first.visible = true;
        }

        let (reaper, worker_events) = CompletionReaper::build();

        log::info!(
            "{} built scheduler with {} player slot(s)",
            LOG_TAG_SCHEDULER,
            pool.len()
        );

        Self {
            pool,
            registry: BusyRegistry::new(),
            reaper,
            worker_events,
            output_prefix,
            source_created: chrono::Local::now().naive_local(),
            retry_policy,
        }
    }

    pub fn set_output_prefix(&mut self, prefix: impl Into<String>) {
        self.output_prefix = prefix.into();
    }

    pub fn set_source_created(&mut self, created: NaiveDateTime) {
        log::debug!("{} source created {}", LOG_TAG_SCHEDULER, created);
        self.source_created = created;
    }

    pub fn current_handle(&self) -> Option<Arc<dyn PlayerHandle>> {
        self.pool.current().map(|slot| Arc::clone(&slot.handle))
    }

    pub fn current_slot_id(&self) -> Option<SlotId> {
        self.pool.current().map(|slot| slot.id)
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn pending_captures(&self) -> usize {
        self.registry.pending_count()
    }

    #[allow(dead_code)]
    pub fn is_slot_busy(&self, slot_id: SlotId) -> bool {
        self.registry.is_busy(slot_id)
    }

    /// Number of slots currently presented to the user. Exactly one by
    /// invariant while the pool is non-empty.
    #[allow(dead_code)]
    pub fn visible_slot_count(&self) -> usize {
        self.pool.iter().filter(|slot| slot.visible).count()
    }

    pub fn status(&self) -> SchedulerStatus {
        match self.pool.current() {
            Some(slot) if self.registry.is_busy(slot.id) => SchedulerStatus::Busy,
            _ => SchedulerStatus::Ready,
        }
    }

    /// Captures a still frame of the current slot at its present playback
    /// position, then rotates the pool to the next free slot so the caller
    /// is never left holding a busy player.
    ///
    /// Returns the artifact path reserved for this capture; the file appears
    /// there once the background worker's snapshot request completes.
    pub fn capture(&mut self) -> Result<PathBuf, CaptureError> {
        if self.output_prefix.trim().is_empty() {
            return Err(CaptureError::EmptyTarget);
        }

        let (slot_id, handle) = match self.pool.current() {
            Some(slot) => (slot.id, Arc::clone(&slot.handle)),
            None => {
                return Err(CaptureError::Player(anyhow::anyhow!(
                    "capture requested but the player pool is empty"
                )))
            }
        };

        if self.registry.is_busy(slot_id) {
            return Err(CaptureError::AlreadyBusy(slot_id));
        }

        let position = handle.get_position()?;
        let duration = handle.get_duration()?;
        let playback_offset = duration.mul_f64(position.clamp(0.0, 1.0));

        let stamp = CaptureStamp::from_playback(self.source_created, playback_offset);
        let (path, _) = find_unused_artifact_path(&self.output_prefix, stamp);

        self.registry.mark_busy(slot_id, path.clone())?;

        log::info!(
            "{} capture on slot {} -> {:?}",
            LOG_TAG_SCHEDULER,
            slot_id,
            path
        );

        spawn_snapshot_worker(
            handle,
            slot_id,
            path.clone(),
            self.retry_policy,
            self.worker_events.clone(),
        );

        rotate_to_next_free(&mut self.pool, &self.registry)?;

        Ok(path)
    }

    /// Manual rotation to the next free slot, preserving each slot's own
    /// playback state. Returns whether the current slot actually changed.
    pub fn rotate(&mut self) -> Result<bool, CaptureError> {
        rotate_to_next_free(&mut self.pool, &self.registry)
    }

    /// Drives the completion reaper: reconciles pending captures against the
    /// filesystem, applies worker timeouts, and rotates off a busy current
    /// slot. Call on a fixed period.
    pub fn tick(&mut self) -> Result<TickReport, CaptureError> {
        self.reaper.reap(&mut self.pool, &mut self.registry)
    }

    /// Drops all pending captures without waiting for their artifacts.
    /// In-flight workers run out their retry bounds on their own.
    pub fn shutdown(&mut self) {
        self.registry.clear();
    }
}

/// Rotates to the next slot without a pending capture; stays put when every
/// slot is busy. The outgoing slot is paused and keeps its own resume
/// memento; the incoming slot resumes from its own remembered state, never
/// the outgoing slot's.
pub(crate) fn rotate_to_next_free(
    pool: &mut RotatingPool<PlayerSlot>,
    registry: &BusyRegistry,
) -> Result<bool, CaptureError> {
    let outgoing_id = {
        let Some(outgoing) = pool.current_mut() else {
            return Ok(false);
        };

        let was_playing = outgoing.handle.is_playing()?;
        let position = outgoing.handle.get_position()?;
        outgoing.handle.pause()?;
        outgoing.resume_state = ResumeState {
            was_playing,
            position,
        };
        outgoing.visible = false;
        outgoing.id
    };

    for _ in 0..pool.len() {
        pool.next();
        let current_is_busy = pool
            .current()
            .map(|slot| registry.is_busy(slot.id))
            .unwrap_or(false);
        if !current_is_busy {
            break;
        }
    }

    let Some(incoming) = pool.current_mut() else {
        return Ok(false);
    };
    incoming.visible = true;

    let incoming_busy = registry.is_busy(incoming.id);
    if incoming.resume_state.was_playing && !incoming_busy {
        incoming.handle.play()?;
        incoming.handle.set_position(incoming.resume_state.position)?;
    }

    let rotated = incoming.id != outgoing_id;
    log::debug!(
        "{} rotation {} -> {} (moved: {})",
        LOG_TAG_SCHEDULER,
        outgoing_id,
        incoming.id,
        rotated
    );

    Ok(rotated)
}

fn spawn_snapshot_worker(
    handle: Arc<dyn PlayerHandle>,
    slot_id: SlotId,
    path: PathBuf,
    policy: SnapshotRetryPolicy,
    events: mpsc::UnboundedSender<WorkerEvent>,
) {
    tokio::spawn(run_snapshot_worker(handle, slot_id, path, policy, events));
}

/// Background retry loop for one capture. Completion is observed by the
/// reaper through the filesystem; the only message a worker ever sends is
/// the timeout notice after its retry bound elapses.
async fn run_snapshot_worker(
    handle: Arc<dyn PlayerHandle>,
    slot_id: SlotId,
    path: PathBuf,
    policy: SnapshotRetryPolicy,
    events: mpsc::UnboundedSender<WorkerEvent>,
) {
    log::debug!("{} slot {} start -> {:?}", LOG_TAG_WORKER, slot_id, path);

    for attempt in 1..=policy.max_attempts {
        if path.exists() {
            log::debug!(
                "{} slot {} artifact appeared after {} attempt(s)",
                LOG_TAG_WORKER,
                slot_id,
                attempt - 1
            );
            return;
        }

        if let Err(error) = handle.request_snapshot(&path).await {
            log::warn!(
                "{} slot {} snapshot request failed: {:#}",
                LOG_TAG_WORKER,
                slot_id,
                error
            );
        }

        tokio::time::sleep(policy.poll_interval).await;
    }

    if path.exists() {
        return;
    }

    log::warn!(
        "{} slot {} gave up after {} attempts",
        LOG_TAG_WORKER,
        slot_id,
        policy.max_attempts
    );

    let _ = events.send(WorkerEvent::SnapshotTimedOut {
        slot_id,
        path,
        attempts: policy.max_attempts,
    });
}
