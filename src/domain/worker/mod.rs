//! Background owner worker domain types

mod lifecycle;

pub use lifecycle::{InvalidStateTransition, WorkerLifecycle, WorkerState};

/// Exit status of a worker process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Superseded or shut down through the window-destroyed path
    Clean,
    /// Could not become selection owner (display missing or another owner won)
    AcquireFailed,
    /// Shutdown requested but the window could not be torn down
    Emergency,
}

impl WorkerExit {
    /// Process exit status for this outcome
    pub const fn code(&self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::AcquireFailed => 1,
            Self::Emergency => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        assert_eq!(WorkerExit::Clean.code(), 0);
        assert_eq!(WorkerExit::AcquireFailed.code(), 1);
        assert_eq!(WorkerExit::Emergency.code(), 2);
    }
}
