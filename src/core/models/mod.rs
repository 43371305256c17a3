mod busy_registry;
mod capture_stamp;
mod rotating_pool;
mod scheduler_status;
mod slot;

pub use busy_registry::{BusyRegistry, ResolvedCapture};
pub use capture_stamp::{find_unused_artifact_path, CaptureStamp};
pub use rotating_pool::{physical_index, RotatingPool};
pub use scheduler_status::SchedulerStatus;
pub use slot::{PlayerSlot, ResumeState, SlotId};
