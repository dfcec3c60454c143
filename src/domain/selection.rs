//! Selection ownership state machine

use std::fmt;
use thiserror::Error;

/// Who currently serves the CLIPBOARD selection, from this process' view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OwnershipState {
    #[default]
    Unowned,
    OwnedByThisProcess,
    HandedToManager,
}

impl OwnershipState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unowned => "unowned",
            Self::OwnedByThisProcess => "owned",
            Self::HandedToManager => "handed-to-manager",
        }
    }
}

impl fmt::Display for OwnershipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an ownership transition does not apply to the current state
#[derive(Debug, Clone, Error)]
#[error("Invalid ownership transition: cannot {action} while {current_state}")]
pub struct InvalidOwnershipTransition {
    pub current_state: OwnershipState,
    pub action: String,
}

/// Tracks selection ownership for one window.
///
/// State machine:
///   UNOWNED -> OWNED (acquire)
///   OWNED -> UNOWNED (lose, on SelectionClear)
///   OWNED -> HANDED_TO_MANAGER (hand_to_manager)
///   any -> UNOWNED (release, window destroyed)
///
/// The X server is the authority on ownership; this only mirrors what the
/// events told us.
#[derive(Debug, Default)]
pub struct SelectionOwnership {
    state: OwnershipState,
}

impl SelectionOwnership {
    pub fn new() -> Self {
        Self {
            state: OwnershipState::Unowned,
        }
    }

    /// Tracker for a window the server just confirmed as owner
    pub fn acquired() -> Self {
        Self {
            state: OwnershipState::OwnedByThisProcess,
        }
    }

    pub fn state(&self) -> OwnershipState {
        self.state
    }

    pub fn is_owned(&self) -> bool {
        self.state == OwnershipState::OwnedByThisProcess
    }

    /// The X server confirmed our window as selection owner
    pub fn acquire(&mut self) -> Result<(), InvalidOwnershipTransition> {
        if self.state == OwnershipState::OwnedByThisProcess {
            return Err(self.invalid("acquire ownership"));
        }
        self.state = OwnershipState::OwnedByThisProcess;
        Ok(())
    }

    /// Another client became owner
    pub fn lose(&mut self) -> Result<(), InvalidOwnershipTransition> {
        if self.state != OwnershipState::OwnedByThisProcess {
            return Err(self.invalid("lose ownership"));
        }
        self.state = OwnershipState::Unowned;
        Ok(())
    }

    /// The clipboard manager took the content over
    pub fn hand_to_manager(&mut self) -> Result<(), InvalidOwnershipTransition> {
        if self.state != OwnershipState::OwnedByThisProcess {
            return Err(self.invalid("hand over to the clipboard manager"));
        }
        self.state = OwnershipState::HandedToManager;
        Ok(())
    }

    /// The owning window is gone; nothing is served any more
    pub fn release(&mut self) {
        self.state = OwnershipState::Unowned;
    }

    fn invalid(&self, action: &str) -> InvalidOwnershipTransition {
        InvalidOwnershipTransition {
            current_state: self.state,
            action: action.to_string(),
        }
    }
}
