//! Background owner worker state machine

use std::fmt;
use thiserror::Error;

/// Worker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorkerState {
    #[default]
    Starting,
    Owning,
    Terminating,
    Exited,
}

impl WorkerState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Owning => "owning",
            Self::Terminating => "terminating",
            Self::Exited => "exited",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: WorkerState,
    pub action: String,
}

/// Lifecycle of the background owner worker.
///
/// State machine:
///   STARTING -> OWNING (begin_owning, selection acquired)
///   OWNING -> TERMINATING (begin_terminating, SelectionClear or shutdown request)
///   OWNING -> EXITED (finish, window destroyed)
///   TERMINATING -> EXITED (finish, window destroyed)
#[derive(Debug, Default)]
pub struct WorkerLifecycle {
    state: WorkerState,
}

impl WorkerLifecycle {
    /// Create a new lifecycle in starting state
    pub fn new() -> Self {
        Self {
            state: WorkerState::Starting,
        }
    }

    /// Get the current state
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Whether the event loop should keep running
    pub fn is_running(&self) -> bool {
        self.state != WorkerState::Exited
    }

    pub fn is_owning(&self) -> bool {
        self.state == WorkerState::Owning
    }

    /// Transition from STARTING to OWNING
    pub fn begin_owning(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != WorkerState::Starting {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "begin owning".to_string(),
            });
        }
        self.state = WorkerState::Owning;
        Ok(())
    }

    /// Transition from OWNING to TERMINATING
    pub fn begin_terminating(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != WorkerState::Owning {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "begin terminating".to_string(),
            });
        }
        self.state = WorkerState::Terminating;
        Ok(())
    }

    /// Transition from OWNING or TERMINATING to EXITED
    pub fn finish(&mut self) -> Result<(), InvalidStateTransition> {
        if !matches!(self.state, WorkerState::Owning | WorkerState::Terminating) {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "finish".to_string(),
            });
        }
        self.state = WorkerState::Exited;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lifecycle_is_starting() {
        let lifecycle = WorkerLifecycle::new();
        assert_eq!(lifecycle.state(), WorkerState::Starting);
        assert!(lifecycle.is_running());
        assert!(!lifecycle.is_owning());
    }

    #[test]
    fn begin_owning_from_starting() {
        let mut lifecycle = WorkerLifecycle::new();
        assert!(lifecycle.begin_owning().is_ok());
        assert!(lifecycle.is_owning());
    }

    #[test]
    fn begin_owning_twice_fails() {
        let mut lifecycle = WorkerLifecycle::new();
        lifecycle.begin_owning().unwrap();

        let err = lifecycle.begin_owning().unwrap_err();
        assert_eq!(err.current_state, WorkerState::Owning);
        assert!(err.action.contains("begin owning"));
    }

    #[test]
    fn terminating_requires_owning() {
        let mut lifecycle = WorkerLifecycle::new();

        let err = lifecycle.begin_terminating().unwrap_err();
        assert_eq!(err.current_state, WorkerState::Starting);
    }

    #[test]
    fn finish_from_owning() {
        let mut lifecycle = WorkerLifecycle::new();
        lifecycle.begin_owning().unwrap();

        assert!(lifecycle.finish().is_ok());
        assert!(!lifecycle.is_running());
    }

    #[test]
    fn finish_from_starting_fails() {
        let mut lifecycle = WorkerLifecycle::new();

        let err = lifecycle.finish().unwrap_err();
        assert_eq!(err.current_state, WorkerState::Starting);
    }

    #[test]
    fn cannot_leave_exited() {
        let mut lifecycle = WorkerLifecycle::new();
        lifecycle.begin_owning().unwrap();
        lifecycle.finish().unwrap();

        assert!(lifecycle.begin_owning().is_err());
        assert!(lifecycle.begin_terminating().is_err());
        assert!(lifecycle.finish().is_err());
    }

    #[test]
    fn full_cycle() {
        let mut lifecycle = WorkerLifecycle::new();

        lifecycle.begin_owning().unwrap();
        assert_eq!(lifecycle.state(), WorkerState::Owning);

        lifecycle.begin_terminating().unwrap();
        assert_eq!(lifecycle.state(), WorkerState::Terminating);
        assert!(lifecycle.is_running());

        lifecycle.finish().unwrap();
        assert_eq!(lifecycle.state(), WorkerState::Exited);
    }

    #[test]
    fn state_display() {
        assert_eq!(WorkerState::Starting.to_string(), "starting");
        assert_eq!(WorkerState::Owning.to_string(), "owning");
        assert_eq!(WorkerState::Terminating.to_string(), "terminating");
        assert_eq!(WorkerState::Exited.to_string(), "exited");
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition {
            current_state: WorkerState::Exited,
            action: "begin owning".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("begin owning"));
        assert!(msg.contains("exited"));
    }
}
