#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::core::errors::CaptureError;
    use crate::core::interfaces::ports::PlayerHandle;
    use crate::core::models::SchedulerStatus;
    use crate::core::orchestrators::{CaptureScheduler, SnapshotRetryPolicy};

    const MEDIA_DURATION_SECS: u64 = 100;

    struct ScriptedState {
        playing: bool,
        position: f64,
        rate: f32,
    }

    /// A player whose snapshot primitive never produces a file on its own,
    /// so tests control exactly when each artifact "appears".
    struct ScriptedPlayerHandle {
        state: Mutex<ScriptedState>,
        snapshot_requests: Mutex<Vec<PathBuf>>,
    }

    impl ScriptedPlayerHandle {
        fn paused_at(position: f64) -> Arc<Self> {
            Self::build(false, position)
        }

        fn playing_at(position: f64) -> Arc<Self> {
            Self::build(true, position)
        }

        fn build(playing: bool, position: f64) -> Arc<Self> {
            Arc::new(Self {
                state: Mutex::new(ScriptedState {
                    playing,
                    position,
                    rate: 1.0,
                }),
                snapshot_requests: Mutex::new(Vec::new()),
            })
        }

        fn snapshot_request_count(&self) -> usize {
            self.snapshot_requests.lock().unwrap().len()
        }

        fn position(&self) -> f64 {
            self.state.lock().unwrap().position
        }

        fn playing(&self) -> bool {
            self.state.lock().unwrap().playing
        }
    }

    #[async_trait]
    impl PlayerHandle for ScriptedPlayerHandle {
        fn play(&self) -> Result<()> {
            self.state.lock().unwrap().playing = true;
            Ok(())
        }

        fn pause(&self) -> Result<()> {
            self.state.lock().unwrap().playing = false;
            Ok(())
        }

        fn is_playing(&self) -> Result<bool> {
            Ok(self.state.lock().unwrap().playing)
        }

        fn get_position(&self) -> Result<f64> {
            Ok(self.state.lock().unwrap().position)
        }

        fn set_position(&self, normalized: f64) -> Result<()> {
            self.state.lock().unwrap().position = normalized;
            Ok(())
        }

        fn get_rate(&self) -> Result<f32> {
            Ok(self.state.lock().unwrap().rate)
        }

        fn set_rate(&self, rate: f32) -> Result<()> {
            self.state.lock().unwrap().rate = rate;
            Ok(())
        }

        fn step_frame(&self) -> Result<()> {
            Ok(())
        }

        fn get_duration(&self) -> Result<Duration> {
            Ok(Duration::from_secs(MEDIA_DURATION_SECS))
        }

        async fn request_snapshot(&self, path: &Path) -> Result<()> {
            self.snapshot_requests.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    struct TestHarness {
        scheduler: CaptureScheduler,
        artifact_dir: PathBuf,
    }

    impl Drop for TestHarness {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.artifact_dir);
        }
    }

    fn fixed_source_created() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    /// A retry policy that keeps workers polling for the whole test, so busy
    /// state only changes when the test creates the artifact.
    fn patient_policy() -> SnapshotRetryPolicy {
        SnapshotRetryPolicy {
            poll_interval: Duration::from_millis(5),
            max_attempts: 100_000,
        }
    }

    fn build_harness(
        players: Vec<Arc<ScriptedPlayerHandle>>,
        policy: SnapshotRetryPolicy,
    ) -> TestHarness {
        let artifact_dir =
            std::env::temp_dir().join(format!("scheduler-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&artifact_dir).unwrap();
        let prefix = artifact_dir.join("out").to_string_lossy().into_owned();

        let handles: Vec<Arc<dyn PlayerHandle>> = players
            .iter()
            .map(|player| Arc::clone(player) as Arc<dyn PlayerHandle>)
            .collect();

        let mut scheduler = CaptureScheduler::build(handles, prefix, policy);
        scheduler.set_source_created(fixed_source_created());

        TestHarness {
            scheduler,
            artifact_dir,
        }
    }

    #[tokio::test]
    async fn test_capture_with_empty_prefix_fails_with_empty_target() {
        let player = ScriptedPlayerHandle::paused_at(0.0);
        let mut harness = build_harness(vec![Arc::clone(&player)], patient_policy());
        harness.scheduler.set_output_prefix("");

        let outcome = harness.scheduler.capture();

        assert!(matches!(outcome, Err(CaptureError::EmptyTarget)));
        assert_eq!(harness.scheduler.pending_captures(), 0);
        assert_eq!(player.snapshot_request_count(), 0);
    }

    #[tokio::test]
    async fn test_capture_reserves_sortable_path_marks_busy_and_rotates() {
        let first = ScriptedPlayerHandle::paused_at(0.0);
        let second = ScriptedPlayerHandle::paused_at(0.0);
        let mut harness = build_harness(
            vec![Arc::clone(&first), Arc::clone(&second)],
            patient_policy(),
        );

        let first_slot = harness.scheduler.current_slot_id().unwrap();
        let path = harness.scheduler.capture().unwrap();

        let expected = harness.artifact_dir.join("out 23-01-01 10-00-00-000.png");
        assert_eq!(path, expected);

        assert!(harness.scheduler.is_slot_busy(first_slot));
        let current_slot = harness.scheduler.current_slot_id().unwrap();
        assert_ne!(current_slot, first_slot);
        assert!(!harness.scheduler.is_slot_busy(current_slot));
        assert_eq!(harness.scheduler.status(), SchedulerStatus::Ready);
    }

    #[tokio::test]
    async fn test_end_to_end_capture_resolve_and_immediate_second_capture() {
        let first = ScriptedPlayerHandle::paused_at(0.0);
        let second = ScriptedPlayerHandle::paused_at(0.0);
        let mut harness = build_harness(
            vec![Arc::clone(&first), Arc::clone(&second)],
            patient_policy(),
        );

        let first_slot = harness.scheduler.current_slot_id().unwrap();
        let first_path = harness.scheduler.capture().unwrap();
        assert!(harness.scheduler.is_slot_busy(first_slot));

        // The capture completes in the background: the artifact appears
        // between two ticks without any signal to the scheduler.
        std::fs::write(&first_path, b"frame").unwrap();
        let report = harness.scheduler.tick().unwrap();

        assert_eq!(report.resolved.len(), 1);
        assert_eq!(report.resolved[0].path, first_path);
        assert!(!harness.scheduler.is_slot_busy(first_slot));
        assert_eq!(harness.scheduler.pending_captures(), 0);

        // Same rendered millisecond, so the second capture advances by 1 ms
        // to dodge the file that now exists.
        let second_path = harness.scheduler.capture().unwrap();
        assert_eq!(
            second_path,
            harness.artifact_dir.join("out 23-01-01 10-00-00-001.png")
        );
        assert_eq!(harness.scheduler.pending_captures(), 1);
    }

    #[tokio::test]
    async fn test_capture_on_busy_current_slot_fails_with_already_busy() {
        let only = ScriptedPlayerHandle::paused_at(0.0);
        let mut harness = build_harness(vec![Arc::clone(&only)], patient_policy());

        let slot = harness.scheduler.current_slot_id().unwrap();
        harness.scheduler.capture().unwrap();
        assert!(harness.scheduler.is_slot_busy(slot));

        let outcome = harness.scheduler.capture();

        assert!(matches!(outcome, Err(CaptureError::AlreadyBusy(id)) if id == slot));
        assert_eq!(harness.scheduler.pending_captures(), 1);
    }

    #[tokio::test]
    async fn test_busy_slots_are_never_selected_as_current() {
        let players = vec![
            ScriptedPlayerHandle::paused_at(0.1),
            ScriptedPlayerHandle::paused_at(0.2),
            ScriptedPlayerHandle::paused_at(0.3),
        ];
        let mut harness = build_harness(players, patient_policy());

        let first_busy = harness.scheduler.current_slot_id().unwrap();
        harness.scheduler.capture().unwrap();
        let second_busy = harness.scheduler.current_slot_id().unwrap();
        harness.scheduler.capture().unwrap();

        let current = harness.scheduler.current_slot_id().unwrap();
        assert_ne!(current, first_busy);
        assert_ne!(current, second_busy);
        assert!(!harness.scheduler.is_slot_busy(current));
        assert_eq!(harness.scheduler.status(), SchedulerStatus::Ready);
    }

    #[tokio::test]
    async fn test_all_slots_busy_falls_back_to_staying_on_current() {
        let players = vec![
            ScriptedPlayerHandle::paused_at(0.1),
            ScriptedPlayerHandle::paused_at(0.2),
        ];
        let mut harness = build_harness(players, patient_policy());

        harness.scheduler.capture().unwrap();
        let before = harness.scheduler.current_slot_id().unwrap();
        harness.scheduler.capture().unwrap();

        assert_eq!(harness.scheduler.current_slot_id().unwrap(), before);
        assert_eq!(harness.scheduler.status(), SchedulerStatus::Busy);
        assert!(matches!(
            harness.scheduler.capture(),
            Err(CaptureError::AlreadyBusy(_))
        ));
    }

    #[tokio::test]
    async fn test_tick_forces_rotation_off_a_busy_current_slot() {
        let players = vec![
            ScriptedPlayerHandle::paused_at(0.1),
            ScriptedPlayerHandle::paused_at(0.2),
        ];
        let mut harness = build_harness(players, patient_policy());

        let first_slot = harness.scheduler.current_slot_id().unwrap();
        let first_path = harness.scheduler.capture().unwrap();
        harness.scheduler.capture().unwrap();

        // Both slots busy, stuck on the second. Finishing the first capture
        // gives the reaper somewhere to rotate to.
        std::fs::write(&first_path, b"frame").unwrap();
        let report = harness.scheduler.tick().unwrap();

        assert!(report.forced_rotation);
        assert_eq!(harness.scheduler.current_slot_id().unwrap(), first_slot);
        assert_eq!(report.status, SchedulerStatus::Ready);
    }

    #[tokio::test]
    async fn test_tick_resyncs_position_when_current_slot_becomes_free() {
        let only = ScriptedPlayerHandle::paused_at(0.37);
        let mut harness = build_harness(vec![Arc::clone(&only)], patient_policy());

        let path = harness.scheduler.capture().unwrap();
        assert_eq!(harness.scheduler.status(), SchedulerStatus::Busy);

        std::fs::write(&path, b"frame").unwrap();
        let report = harness.scheduler.tick().unwrap();

        let resynced = report.resynced_position.unwrap();
        assert!((resynced - 0.37).abs() < 1e-9);
        assert_eq!(report.status, SchedulerStatus::Ready);
    }

    #[tokio::test]
    async fn test_worker_timeout_force_clears_the_pending_capture() {
        let only = ScriptedPlayerHandle::paused_at(0.0);
        let policy = SnapshotRetryPolicy {
            poll_interval: Duration::from_millis(5),
            max_attempts: 2,
        };
        let mut harness = build_harness(vec![Arc::clone(&only)], policy);

        harness.scheduler.capture().unwrap();
        assert_eq!(harness.scheduler.pending_captures(), 1);

        // Let the worker burn through its retry bound.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let report = harness.scheduler.tick().unwrap();

        assert_eq!(report.timed_out.len(), 1);
        assert_eq!(report.timed_out[0].attempts, 2);
        assert_eq!(harness.scheduler.pending_captures(), 0);
        assert_eq!(harness.scheduler.status(), SchedulerStatus::Ready);
        assert!(only.snapshot_request_count() >= 1);
    }

    #[tokio::test]
    async fn test_rotation_restores_each_slots_own_remembered_state() {
        let first = ScriptedPlayerHandle::playing_at(0.4);
        let second = ScriptedPlayerHandle::paused_at(0.7);
        let mut harness = build_harness(
            vec![Arc::clone(&first), Arc::clone(&second)],
            patient_policy(),
        );

        // Rotate away: the playing slot is paused and hands off.
        assert!(harness.scheduler.rotate().unwrap());
        assert!(!first.playing());
        assert!(!second.playing());
        assert!((second.position() - 0.7).abs() < 1e-9);

        // Rotate back: the first slot resumes its own state; the second
        // keeps its own position instead of inheriting 0.4.
        assert!(harness.scheduler.rotate().unwrap());
        assert!(first.playing());
        assert!((first.position() - 0.4).abs() < 1e-9);
        assert!((second.position() - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_exactly_one_slot_is_visible_across_rotations() {
        let players = vec![
            ScriptedPlayerHandle::paused_at(0.1),
            ScriptedPlayerHandle::paused_at(0.2),
            ScriptedPlayerHandle::paused_at(0.3),
        ];
        let mut harness = build_harness(players, patient_policy());

        assert_eq!(harness.scheduler.visible_slot_count(), 1);

        harness.scheduler.capture().unwrap();
        assert_eq!(harness.scheduler.visible_slot_count(), 1);

        harness.scheduler.rotate().unwrap();
        assert_eq!(harness.scheduler.visible_slot_count(), 1);
    }

    #[tokio::test]
    async fn test_capture_skips_paths_already_taken_on_disk() {
        let only = ScriptedPlayerHandle::paused_at(0.0);
        let mut harness = build_harness(vec![Arc::clone(&only)], patient_policy());

        let occupied = harness.artifact_dir.join("out 23-01-01 10-00-00-000.png");
        std::fs::write(&occupied, b"earlier capture").unwrap();

        let path = harness.scheduler.capture().unwrap();

        assert_eq!(
            path,
            harness.artifact_dir.join("out 23-01-01 10-00-00-001.png")
        );
    }

    #[tokio::test]
    async fn test_capture_timestamp_derives_from_playback_position() {
        // 37% into 100 s of media = 37 s past the source creation time.
        let only = ScriptedPlayerHandle::paused_at(0.37);
        let mut harness = build_harness(vec![Arc::clone(&only)], patient_policy());

        let path = harness.scheduler.capture().unwrap();

        assert_eq!(
            path,
            harness.artifact_dir.join("out 23-01-01 10-00-37-000.png")
        );
    }
}
