//! Display connection helpers shared by reader, worker and manager bridge

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ConnectionExt as _, CreateWindowAux, EventMask, Window, WindowClass};
use x11rb::rust_connection::RustConnection;
use x11rb::COPY_DEPTH_FROM_PARENT;

use super::atoms::Atoms;
use crate::application::ports::ClipboardError;
use crate::domain::config::ClipboardSettings;

/// An open display connection with its atoms resolved
pub struct Display {
    pub conn: RustConnection,
    pub screen: usize,
    pub atoms: Atoms,
}

impl Display {
    /// Connect to the configured display and intern the protocol atoms
    pub fn open(settings: &ClipboardSettings) -> Result<Self, ClipboardError> {
        let (conn, screen) = x11rb::connect(settings.display.as_deref())
            .map_err(|e| ClipboardError::ConnectionFailed(e.to_string()))?;
        let atoms = Atoms::new(&conn)?.reply()?;
        Ok(Self {
            conn,
            screen,
            atoms,
        })
    }

    /// Create an unmapped 1x1 window used only as a selection endpoint
    pub fn create_hidden_window(&self, event_mask: EventMask) -> Result<Window, ClipboardError> {
        let screen = &self.conn.setup().roots[self.screen];
        let window = self.conn.generate_id()?;
        self.conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            window,
            screen.root,
            0,
            0,
            1,
            1,
            0,
            WindowClass::INPUT_OUTPUT,
            screen.root_visual,
            &CreateWindowAux::new().event_mask(event_mask),
        )?;
        Ok(window)
    }

    /// Destroy a window, ignoring a connection that is already gone
    pub fn discard_window(&self, window: Window) {
        let _ = self.conn.destroy_window(window);
        let _ = self.conn.flush();
    }
}

/// Fail fast when no display server is reachable
pub fn probe(settings: &ClipboardSettings) -> Result<(), ClipboardError> {
    x11rb::connect(settings.display.as_deref())
        .map(|_| ())
        .map_err(|e| ClipboardError::ConnectionFailed(e.to_string()))
}
