//! Win32 clipboard adapter
//!
//! The OS keeps clipboard data itself, so both operations are a plain
//! open / transfer / close sequence with no process left behind.

use std::ptr;

use windows_sys::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, GetClipboardData, IsClipboardFormatAvailable, OpenClipboard,
    SetClipboardData,
};
use windows_sys::Win32::System::Memory::{
    GlobalAlloc, GlobalFree, GlobalLock, GlobalUnlock, GMEM_MOVEABLE,
};
use windows_sys::Win32::System::Ole::CF_UNICODETEXT;

use crate::application::ports::{Clipboard, ClipboardError, Delivery};
use crate::domain::content::ClipboardContent;

/// Clipboard adapter for the Win32 API
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Clipboard;

impl Win32Clipboard {
    pub fn new() -> Self {
        Self
    }
}

/// Keeps the clipboard open for the lifetime of the guard
struct OpenGuard;

impl OpenGuard {
    fn open() -> Result<Self, ClipboardError> {
        // SAFETY: a null owner window associates the clipboard with this task
        if unsafe { OpenClipboard(ptr::null_mut()) } == 0 {
            return Err(ClipboardError::ConnectionFailed(
                "cannot open the clipboard".to_string(),
            ));
        }
        Ok(Self)
    }
}

impl Drop for OpenGuard {
    fn drop(&mut self) {
        // SAFETY: the clipboard was opened by this guard
        unsafe {
            CloseClipboard();
        }
    }
}

impl Clipboard for Win32Clipboard {
    fn read(&self) -> Result<ClipboardContent, ClipboardError> {
        let format = CF_UNICODETEXT as u32;
        // SAFETY: plain query without preconditions
        if unsafe { IsClipboardFormatAvailable(format) } == 0 {
            return Err(ClipboardError::UnsupportedFormat);
        }

        let _open = OpenGuard::open()?;

        // SAFETY: the clipboard is open; the handle stays owned by the OS
        let handle = unsafe { GetClipboardData(format) };
        if handle.is_null() {
            return Err(ClipboardError::UnsupportedFormat);
        }

        // SAFETY: CF_UNICODETEXT handles are global memory blocks
        let data = unsafe { GlobalLock(handle) } as *const u16;
        if data.is_null() {
            return Err(ClipboardError::ConnectionFailed(
                "cannot lock clipboard data".to_string(),
            ));
        }

        // SAFETY: CF_UNICODETEXT data is NUL-terminated UTF-16
        let wide = unsafe {
            let mut len = 0;
            while *data.add(len) != 0 {
                len += 1;
            }
            std::slice::from_raw_parts(data, len)
        };
        let text = String::from_utf16(wide);

        // SAFETY: balanced with the GlobalLock above
        unsafe {
            GlobalUnlock(handle);
        }

        let text = text.map_err(|e| ClipboardError::EncodingError(e.to_string()))?;
        Ok(ClipboardContent::from_text(&text)?)
    }

    fn write(&self, content: &ClipboardContent) -> Result<Delivery, ClipboardError> {
        let text = content.to_text()?;
        let mut wide: Vec<u16> = text.encode_utf16().collect();
        wide.push(0);
        let size = wide.len() * std::mem::size_of::<u16>();

        let _open = OpenGuard::open()?;

        // SAFETY: the clipboard is open
        if unsafe { EmptyClipboard() } == 0 {
            return Err(ClipboardError::ConnectionFailed(
                "cannot empty the clipboard".to_string(),
            ));
        }

        // SAFETY: allocation result is checked before use
        let memory = unsafe { GlobalAlloc(GMEM_MOVEABLE, size) };
        if memory.is_null() {
            return Err(ClipboardError::ProcessError(
                "cannot allocate clipboard memory".to_string(),
            ));
        }

        // SAFETY: `memory` is a fresh block of `size` bytes
        unsafe {
            let target = GlobalLock(memory) as *mut u16;
            if target.is_null() {
                GlobalFree(memory);
                return Err(ClipboardError::ProcessError(
                    "cannot lock clipboard memory".to_string(),
                ));
            }
            ptr::copy_nonoverlapping(wide.as_ptr(), target, wide.len());
            GlobalUnlock(memory);
        }

        // SAFETY: on success the OS takes ownership of `memory`
        if unsafe { SetClipboardData(CF_UNICODETEXT as u32, memory) }.is_null() {
            unsafe {
                GlobalFree(memory);
            }
            return Err(ClipboardError::ProcessError(
                "cannot hand data to the clipboard".to_string(),
            ));
        }

        tracing::debug!(len = content.len(), "stored text on the Win32 clipboard");
        Ok(Delivery::System)
    }
}
