//! Read and write clipboard use cases
//!
//! Thin validation layer between callers and the platform clipboard port.

use crate::domain::content::ClipboardContent;

use super::ports::{Clipboard, ClipboardError, Delivery};

/// Output from the read use case
#[derive(Debug, Clone)]
pub struct ReadOutput {
    /// Raw bytes served by the clipboard owner
    pub content: ClipboardContent,
}

impl ReadOutput {
    /// Exact byte length of the content
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Content as UTF-8 text
    pub fn text(&self) -> Result<&str, ClipboardError> {
        Ok(self.content.to_text()?)
    }
}

/// Use case: read the current clipboard text
pub struct ReadClipboardUseCase<C: Clipboard> {
    clipboard: C,
}

impl<C: Clipboard> ReadClipboardUseCase<C> {
    pub fn new(clipboard: C) -> Self {
        Self { clipboard }
    }

    pub fn execute(&self) -> Result<ReadOutput, ClipboardError> {
        let content = self.clipboard.read()?;
        tracing::debug!(len = content.len(), "read clipboard content");
        Ok(ReadOutput { content })
    }
}

/// Use case: place text on the clipboard
pub struct WriteClipboardUseCase<C: Clipboard> {
    clipboard: C,
}

impl<C: Clipboard> WriteClipboardUseCase<C> {
    pub fn new(clipboard: C) -> Self {
        Self { clipboard }
    }

    /// Write UTF-8 bytes; invalid UTF-8 is rejected before anything is spawned
    pub fn execute(&self, bytes: &[u8]) -> Result<Delivery, ClipboardError> {
        let content = ClipboardContent::from_utf8(bytes)?;
        self.write_content(&content)
    }

    pub fn execute_text(&self, text: &str) -> Result<Delivery, ClipboardError> {
        let content = ClipboardContent::from_text(text)?;
        self.write_content(&content)
    }

    /// Access the underlying clipboard, e.g. to hold or detach after a write
    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    fn write_content(&self, content: &ClipboardContent) -> Result<Delivery, ClipboardError> {
        let delivery = self.clipboard.write(content)?;
        tracing::debug!(len = content.len(), %delivery, "wrote clipboard content");
        Ok(delivery)
    }
}
