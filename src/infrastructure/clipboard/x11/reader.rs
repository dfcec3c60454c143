//! One-shot CLIPBOARD read

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt as _, EventMask, Window};
use x11rb::protocol::Event;
use x11rb::{CURRENT_TIME, NONE};

use super::display::Display;
use crate::application::ports::ClipboardError;
use crate::domain::config::ClipboardSettings;
use crate::domain::content::ClipboardContent;

/// Largest property size that still fits a signed 32-bit length plus terminator
const MAX_PROPERTY_LEN: u64 = i32::MAX as u64 - 1;

/// Ask the current CLIPBOARD owner for UTF-8 text.
///
/// Blocks until the owner answers. There is no timeout: an owner that never
/// sends SelectionNotify hangs the caller.
pub fn read_selection(settings: &ClipboardSettings) -> Result<ClipboardContent, ClipboardError> {
    let display = Display::open(settings)?;

    let owner = display
        .conn
        .get_selection_owner(display.atoms.CLIPBOARD)?
        .reply()?
        .owner;
    if owner == NONE {
        return Err(ClipboardError::NoOwner);
    }

    let window = display.create_hidden_window(EventMask::NO_EVENT)?;
    let result = fetch(&display, window);
    display.discard_window(window);
    result
}

fn fetch(display: &Display, window: Window) -> Result<ClipboardContent, ClipboardError> {
    let conn = &display.conn;
    let atoms = &display.atoms;

    conn.convert_selection(
        window,
        atoms.CLIPBOARD,
        atoms.UTF8_STRING,
        atoms.CLIPKEEP_STORE,
        CURRENT_TIME,
    )?;
    conn.flush()?;
    tracing::debug!(window, "requested CLIPBOARD as UTF8_STRING");

    let notify = loop {
        if let Event::SelectionNotify(event) = conn.wait_for_event()? {
            if event.requestor == window && event.selection == atoms.CLIPBOARD {
                break event;
            }
        }
    };

    if notify.property == NONE {
        return Err(ClipboardError::UnsupportedFormat);
    }

    // Probe for the size, then fetch exactly that much and delete the property
    let probe = conn
        .get_property(false, window, notify.property, AtomEnum::ANY, 0, 0)?
        .reply()?;
    let size = u64::from(probe.bytes_after);
    if size > MAX_PROPERTY_LEN {
        return Err(ClipboardError::Overflow(size));
    }

    let words = probe.bytes_after.div_ceil(4);
    let reply = conn
        .get_property(true, window, notify.property, AtomEnum::ANY, 0, words)?
        .reply()?;

    let mut bytes = reply.value;
    bytes.truncate(probe.bytes_after as usize);
    tracing::debug!(len = bytes.len(), "received CLIPBOARD content");

    Ok(ClipboardContent::new(bytes)?)
}
