//! Clipboard infrastructure module
//!
//! X11 selections on Unix, the Win32 clipboard API on Windows.

#[cfg(unix)]
pub mod x11;

#[cfg(windows)]
mod win32;

#[cfg(windows)]
pub use win32::Win32Clipboard;
#[cfg(unix)]
pub use x11::X11Clipboard;

use crate::application::ports::Clipboard;
use crate::domain::config::ClipboardSettings;

/// Create the clipboard adapter for the current platform
#[cfg(unix)]
pub fn create_clipboard(settings: ClipboardSettings) -> Box<dyn Clipboard> {
    Box::new(X11Clipboard::new(settings))
}

/// Create the clipboard adapter for the current platform
#[cfg(windows)]
pub fn create_clipboard(_settings: ClipboardSettings) -> Box<dyn Clipboard> {
    Box::new(Win32Clipboard::new())
}
