mod capture_scheduler;
mod completion_reaper;

pub use capture_scheduler::{CaptureScheduler, SnapshotRetryPolicy};
pub use completion_reaper::{TickReport, TimedOutCapture};
