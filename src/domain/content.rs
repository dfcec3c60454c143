//! Clipboard content value object

use std::fmt;

use thiserror::Error;

/// Errors raised when building clipboard content
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("Clipboard content of {len} bytes exceeds the maximum of {max} bytes")]
    Overflow { len: usize, max: usize },

    #[error("Clipboard text is not valid UTF-8: {0}")]
    InvalidUtf8(String),
}

/// Text held on (or destined for) the clipboard.
///
/// The bytes are UTF-8 whenever they come from this crate's own write path.
/// Content read back from another application is kept as raw bytes, since the
/// owner decides what it sends. The length always fits a signed 32-bit
/// integer, the length type of the worker pipe protocol.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ClipboardContent {
    bytes: Vec<u8>,
}

impl ClipboardContent {
    /// Largest byte count representable on the wire
    pub const MAX_LEN: usize = i32::MAX as usize;

    /// Wrap raw bytes, rejecting anything longer than [`Self::MAX_LEN`]
    pub fn new(bytes: Vec<u8>) -> Result<Self, ContentError> {
        if bytes.len() > Self::MAX_LEN {
            return Err(ContentError::Overflow {
                len: bytes.len(),
                max: Self::MAX_LEN,
            });
        }
        Ok(Self { bytes })
    }

    /// Validate and copy UTF-8 bytes
    pub fn from_utf8(bytes: &[u8]) -> Result<Self, ContentError> {
        std::str::from_utf8(bytes).map_err(|e| ContentError::InvalidUtf8(e.to_string()))?;
        Self::new(bytes.to_vec())
    }

    /// Build content from a string slice
    pub fn from_text(text: &str) -> Result<Self, ContentError> {
        Self::new(text.as_bytes().to_vec())
    }

    /// Empty content; the worker starts with this and falls back to it
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Length as carried in a pipe frame header
    pub fn wire_len(&self) -> i32 {
        // MAX_LEN is enforced by every constructor
        self.bytes.len() as i32
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Interpret the content as UTF-8 text
    pub fn to_text(&self) -> Result<&str, ContentError> {
        std::str::from_utf8(&self.bytes).map_err(|e| ContentError::InvalidUtf8(e.to_string()))
    }

    /// Consume the content as a `String`
    pub fn into_text(self) -> Result<String, ContentError> {
        String::from_utf8(self.bytes).map_err(|e| ContentError::InvalidUtf8(e.to_string()))
    }
}

impl fmt::Debug for ClipboardContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipboardContent")
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_keeps_exact_bytes() {
        let content = ClipboardContent::from_text("This is a test.").unwrap();
        assert_eq!(content.len(), 15);
        assert_eq!(content.wire_len(), 15);
        assert_eq!(content.as_bytes(), b"This is a test.");
    }

    #[test]
    fn from_utf8_rejects_invalid_sequences() {
        let err = ClipboardContent::from_utf8(&[0x66, 0xff, 0x6f]).unwrap_err();
        assert!(matches!(err, ContentError::InvalidUtf8(_)));
    }

    #[test]
    fn from_utf8_accepts_multibyte_text() {
        let text = "Umlaut ü, Buckel-ß, greek β";
        let content = ClipboardContent::from_utf8(text.as_bytes()).unwrap();
        assert_eq!(content.to_text().unwrap(), text);
    }

    #[test]
    fn empty_content_is_empty() {
        let content = ClipboardContent::empty();
        assert!(content.is_empty());
        assert_eq!(content.wire_len(), 0);
    }

    #[test]
    fn raw_bytes_are_not_validated() {
        let content = ClipboardContent::new(vec![0xff, 0xfe]).unwrap();
        assert_eq!(content.len(), 2);
        assert!(content.to_text().is_err());
    }

    #[test]
    fn debug_hides_payload() {
        let content = ClipboardContent::from_text("secret").unwrap();
        let debug = format!("{:?}", content);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("len"));
    }
}
