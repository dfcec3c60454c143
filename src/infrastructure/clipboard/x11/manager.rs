//! Handoff to a running clipboard manager
//!
//! When a manager owns CLIPBOARD_MANAGER we briefly own CLIPBOARD ourselves,
//! ask the manager to save it, and serve its requests until it is done.
//! After that the content lives on without a worker process.

use thiserror::Error;
use x11rb::connection::Connection;
use x11rb::errors::{ConnectionError, ReplyError};
use x11rb::protocol::xproto::{Atom, ConnectionExt as _, EventMask, Window};
use x11rb::protocol::Event;
use x11rb::{CURRENT_TIME, NONE};

use super::charset::LocaleConverter;
use super::display::Display;
use super::handler::SelectionRequestHandler;
use crate::application::ports::ClipboardError;
use crate::domain::config::ClipboardSettings;
use crate::domain::content::ClipboardContent;
use crate::domain::selection::{OwnershipState, SelectionOwnership};

/// Why a handoff did not happen
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("No clipboard manager is running")]
    NoManagerAvailable,

    #[error("Clipboard manager did not take the content")]
    Rejected,

    #[error("Clipboard manager handoff failed: {0}")]
    Connection(String),
}

impl From<ClipboardError> for HandoffError {
    fn from(err: ClipboardError) -> Self {
        Self::Connection(err.to_string())
    }
}

impl From<ConnectionError> for HandoffError {
    fn from(err: ConnectionError) -> Self {
        Self::Connection(err.to_string())
    }
}

impl From<ReplyError> for HandoffError {
    fn from(err: ReplyError) -> Self {
        Self::Connection(err.to_string())
    }
}

/// Give `content` to the clipboard manager, blocking until it has it
pub fn hand_off_to_manager(
    settings: &ClipboardSettings,
    content: &ClipboardContent,
) -> Result<(), HandoffError> {
    let display = Display::open(settings)?;
    let atoms = display.atoms;

    let manager = display
        .conn
        .get_selection_owner(atoms.CLIPBOARD_MANAGER)?
        .reply()?
        .owner;
    if manager == NONE {
        return Err(HandoffError::NoManagerAvailable);
    }

    let window = display.create_hidden_window(EventMask::NO_EVENT)?;
    let result = negotiate(&display, window, settings, content);
    display.discard_window(window);
    result
}

fn negotiate(
    display: &Display,
    window: Window,
    settings: &ClipboardSettings,
    content: &ClipboardContent,
) -> Result<(), HandoffError> {
    let conn = &display.conn;
    let atoms = display.atoms;

    conn.set_selection_owner(window, atoms.CLIPBOARD, CURRENT_TIME)?;
    if conn.get_selection_owner(atoms.CLIPBOARD)?.reply()?.owner != window {
        return Err(HandoffError::Rejected);
    }
    let mut handoff = Handoff::acquired();

    conn.convert_selection(
        window,
        atoms.CLIPBOARD_MANAGER,
        atoms.SAVE_TARGETS,
        NONE,
        CURRENT_TIME,
    )?;
    conn.flush()?;
    tracing::debug!(window, "asked clipboard manager to save CLIPBOARD");

    let handler = SelectionRequestHandler::new(
        atoms,
        LocaleConverter::from_environment(settings.conversion_chunk),
    );

    loop {
        let event = conn.wait_for_event()?;
        let kind = match &event {
            Event::SelectionRequest(_) => HandoffEvent::Request,
            Event::SelectionClear(clear) => HandoffEvent::Clear {
                ours: clear.owner == window,
            },
            Event::SelectionNotify(notify)
                if notify.requestor == window && notify.target == atoms.SAVE_TARGETS =>
            {
                HandoffEvent::SaveReply {
                    property: notify.property,
                }
            }
            _ => HandoffEvent::Other,
        };

        match handoff.step(kind) {
            HandoffStep::Answer => {
                if let Event::SelectionRequest(request) = &event {
                    handler.respond(conn, request, content)?;
                }
            }
            HandoffStep::Continue => {}
            HandoffStep::Done(result) => {
                if result.is_ok() && handoff.state() == OwnershipState::HandedToManager {
                    tracing::info!(len = content.len(), "clipboard manager took the content");
                }
                return result;
            }
        }
    }
}

/// Events of the handoff loop, reduced to what ends it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandoffEvent {
    Request,
    /// SelectionClear; `ours` when it names our window
    Clear { ours: bool },
    /// The manager's SelectionNotify for SAVE_TARGETS
    SaveReply { property: Atom },
    Other,
}

#[derive(Debug)]
enum HandoffStep {
    Answer,
    Continue,
    Done(Result<(), HandoffError>),
}

/// Ownership of CLIPBOARD while the manager copies it
#[derive(Debug)]
struct Handoff {
    ownership: SelectionOwnership,
}

impl Handoff {
    /// Our window was just confirmed as CLIPBOARD owner
    fn acquired() -> Self {
        Self {
            ownership: SelectionOwnership::acquired(),
        }
    }

    fn state(&self) -> OwnershipState {
        self.ownership.state()
    }

    fn step(&mut self, event: HandoffEvent) -> HandoffStep {
        match event {
            HandoffEvent::Request if self.ownership.is_owned() => HandoffStep::Answer,
            HandoffEvent::Request | HandoffEvent::Clear { ours: false } | HandoffEvent::Other => {
                HandoffStep::Continue
            }
            HandoffEvent::Clear { ours: true } => match self.ownership.lose() {
                Ok(()) => {
                    // Someone else took over; nothing left for us to serve
                    tracing::debug!("CLIPBOARD superseded during handoff");
                    HandoffStep::Done(Ok(()))
                }
                Err(_) => HandoffStep::Continue,
            },
            HandoffEvent::SaveReply { property } if property != NONE => {
                HandoffStep::Done(Err(HandoffError::Rejected))
            }
            HandoffEvent::SaveReply { .. } => {
                if let Err(e) = self.ownership.hand_to_manager() {
                    tracing::debug!(error = %e, "manager finished after CLIPBOARD moved on");
                }
                HandoffStep::Done(Ok(()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_errors_become_connection_failures() {
        let err = HandoffError::from(ClipboardError::ConnectionFailed("no display".to_string()));
        assert!(matches!(err, HandoffError::Connection(msg) if msg.contains("no display")));
    }

    #[test]
    fn handoff_errors_describe_the_reason() {
        assert_eq!(
            HandoffError::NoManagerAvailable.to_string(),
            "No clipboard manager is running"
        );
        assert_eq!(
            HandoffError::Rejected.to_string(),
            "Clipboard manager did not take the content"
        );
    }

    #[test]
    fn requests_are_answered_while_owned() {
        let mut handoff = Handoff::acquired();
        assert!(matches!(
            handoff.step(HandoffEvent::Request),
            HandoffStep::Answer
        ));
        assert!(matches!(
            handoff.step(HandoffEvent::Other),
            HandoffStep::Continue
        ));
    }

    #[test]
    fn empty_save_reply_hands_content_to_manager() {
        let mut handoff = Handoff::acquired();
        let step = handoff.step(HandoffEvent::SaveReply { property: NONE });
        assert!(matches!(step, HandoffStep::Done(Ok(()))));
        assert_eq!(handoff.state(), OwnershipState::HandedToManager);
    }

    #[test]
    fn save_reply_with_property_is_a_rejection() {
        let mut handoff = Handoff::acquired();
        let step = handoff.step(HandoffEvent::SaveReply { property: 42 });
        assert!(matches!(step, HandoffStep::Done(Err(HandoffError::Rejected))));
        assert_eq!(handoff.state(), OwnershipState::OwnedByThisProcess);
    }

    #[test]
    fn losing_clipboard_ends_handoff() {
        let mut handoff = Handoff::acquired();
        assert!(matches!(
            handoff.step(HandoffEvent::Clear { ours: false }),
            HandoffStep::Continue
        ));

        let step = handoff.step(HandoffEvent::Clear { ours: true });
        assert!(matches!(step, HandoffStep::Done(Ok(()))));
        assert_eq!(handoff.state(), OwnershipState::Unowned);

        // Not ours any more: no more answers, repeated clears change nothing
        assert!(matches!(
            handoff.step(HandoffEvent::Request),
            HandoffStep::Continue
        ));
        assert!(matches!(
            handoff.step(HandoffEvent::Clear { ours: true }),
            HandoffStep::Continue
        ));
    }
}
