//! Clipboard port interface

use std::fmt;

use thiserror::Error;

use crate::domain::content::{ClipboardContent, ContentError};

/// Clipboard errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("Cannot reach the display server: {0}")]
    ConnectionFailed(String),

    #[error("No application currently owns the clipboard")]
    NoOwner,

    #[error("The clipboard owner cannot provide UTF-8 text")]
    UnsupportedFormat,

    #[error("Clipboard content of {0} bytes is too large")]
    Overflow(u64),

    #[error("Clipboard worker process failed: {0}")]
    ProcessError(String),

    #[error("Clipboard worker received a malformed frame: {0}")]
    ProtocolViolation(String),

    #[error("Invalid clipboard text encoding: {0}")]
    EncodingError(String),
}

impl From<ContentError> for ClipboardError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Overflow { len, .. } => Self::Overflow(len as u64),
            ContentError::InvalidUtf8(msg) => Self::EncodingError(msg),
        }
    }
}

/// Where a successful write ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// A clipboard manager copied the content; nothing needs to stay alive
    ClipboardManager,
    /// A background worker of this process serves the content
    BackgroundWorker,
    /// The operating system stores the content itself
    System,
}

impl Delivery {
    /// Whether the content disappears once this process (and its worker) exits
    pub const fn needs_live_owner(&self) -> bool {
        matches!(self, Self::BackgroundWorker)
    }
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ClipboardManager => "clipboard manager",
            Self::BackgroundWorker => "background worker",
            Self::System => "system clipboard",
        };
        write!(f, "{}", text)
    }
}

/// Port for clipboard operations
pub trait Clipboard: Send + Sync {
    /// Read the current clipboard content.
    ///
    /// Blocks until the current owner answers.
    fn read(&self) -> Result<ClipboardContent, ClipboardError>;

    /// Place content on the clipboard.
    ///
    /// # Returns
    /// Where the content was delivered, or an error
    fn write(&self, content: &ClipboardContent) -> Result<Delivery, ClipboardError>;

    /// Block until this process no longer serves the clipboard.
    ///
    /// Backends without a live owner return immediately.
    fn hold(&self) -> Result<(), ClipboardError> {
        Ok(())
    }

    /// Let a running owner outlive this process.
    fn detach(&self) -> Result<(), ClipboardError> {
        Ok(())
    }
}

/// Blanket implementation for boxed clipboard types
impl Clipboard for Box<dyn Clipboard> {
    fn read(&self) -> Result<ClipboardContent, ClipboardError> {
        self.as_ref().read()
    }

    fn write(&self, content: &ClipboardContent) -> Result<Delivery, ClipboardError> {
        self.as_ref().write(content)
    }

    fn hold(&self) -> Result<(), ClipboardError> {
        self.as_ref().hold()
    }

    fn detach(&self) -> Result<(), ClipboardError> {
        self.as_ref().detach()
    }
}

impl<T: Clipboard + ?Sized> Clipboard for &T {
    fn read(&self) -> Result<ClipboardContent, ClipboardError> {
        (**self).read()
    }

    fn write(&self, content: &ClipboardContent) -> Result<Delivery, ClipboardError> {
        (**self).write(content)
    }

    fn hold(&self) -> Result<(), ClipboardError> {
        (**self).hold()
    }

    fn detach(&self) -> Result<(), ClipboardError> {
        (**self).detach()
    }
}
