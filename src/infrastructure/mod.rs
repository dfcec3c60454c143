//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces:
//! the platform clipboards and the XDG config file.

pub mod clipboard;
pub mod config;

// Re-export adapters
pub use clipboard::create_clipboard;
#[cfg(windows)]
pub use clipboard::Win32Clipboard;
#[cfg(unix)]
pub use clipboard::X11Clipboard;
pub use config::XdgConfigStore;
