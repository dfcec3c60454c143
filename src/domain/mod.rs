//! Domain layer - Core clipboard concepts
//!
//! Contains value objects, state machines, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod content;
pub mod error;
pub mod selection;
pub mod worker;

// Re-export common types
pub use config::{AppConfig, ClipboardSettings};
pub use content::ClipboardContent;
pub use error::*;
pub use selection::{OwnershipState, SelectionOwnership};
pub use worker::{WorkerExit, WorkerLifecycle, WorkerState};
