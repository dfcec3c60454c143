//! clipkeep - persistent clipboard text for X11 and Win32
//!
//! Reading returns whatever text the current clipboard owner serves. Writing
//! keeps the text available after the call returns: on X11 it is handed to a
//! clipboard manager when one runs, otherwise a forked worker process keeps
//! owning the selection until another application replaces it.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Clipboard content, ownership and worker state machines, config
//! - **Application**: Read/write use cases and port interfaces (traits)
//! - **Infrastructure**: X11 and Win32 clipboard adapters, config storage
//! - **CLI**: Command-line interface, argument parsing, and logging setup

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

pub use application::ports::{Clipboard, ClipboardError, Delivery};
pub use domain::config::ClipboardSettings;
pub use domain::content::ClipboardContent;
pub use infrastructure::clipboard::create_clipboard;

use application::{ReadClipboardUseCase, WriteClipboardUseCase};

/// Read the clipboard of the default display
pub fn read_clipboard() -> Result<ClipboardContent, ClipboardError> {
    let use_case = ReadClipboardUseCase::new(create_clipboard(ClipboardSettings::default()));
    Ok(use_case.execute()?.content)
}

/// Read the clipboard as UTF-8 text
pub fn read_clipboard_text() -> Result<String, ClipboardError> {
    Ok(read_clipboard()?.into_text()?)
}

/// Put text on the clipboard of the default display
pub fn write_clipboard_text(text: &str) -> Result<Delivery, ClipboardError> {
    WriteClipboardUseCase::new(create_clipboard(ClipboardSettings::default())).execute_text(text)
}

/// Put UTF-8 encoded bytes on the clipboard; anything else is an `EncodingError`
pub fn write_clipboard_bytes(bytes: &[u8]) -> Result<Delivery, ClipboardError> {
    WriteClipboardUseCase::new(create_clipboard(ClipboardSettings::default())).execute(bytes)
}

/// Library name and version
pub fn version() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
