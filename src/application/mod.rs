//! Application layer - Use cases and port interfaces
//!
//! Contains the clipboard operations and trait definitions
//! for external system interactions.

pub mod clipboard;
pub mod ports;

// Re-export use cases
pub use clipboard::{ReadClipboardUseCase, ReadOutput, WriteClipboardUseCase};
