use std::fmt;

/// Coarse indicator shown to the user: whether the current slot can accept a
/// capture right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    Ready,
    Busy,
}

impl fmt::Display for SchedulerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerStatus::Ready => write!(f, "Ready"),
            SchedulerStatus::Busy => write!(f, "Busy"),
        }
    }
}
