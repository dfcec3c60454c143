//! Answers selection requests for content this process owns

use x11rb::connection::Connection;
use x11rb::errors::ConnectionError;
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ConnectionExt as _, EventMask, PropMode, SelectionNotifyEvent,
    SelectionRequestEvent, SELECTION_NOTIFY_EVENT,
};
use x11rb::wrapper::ConnectionExt as _;
use x11rb::NONE;

use super::atoms::Atoms;
use super::charset::LocaleConverter;
use crate::domain::content::ClipboardContent;

/// What a single selection request is answered with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionReply {
    /// Answer with `property = None`
    Refuse,
    /// List of supported targets (type ATOM, format 32)
    Targets(Vec<Atom>),
    /// Text bytes of the given type (format 8)
    Text { kind: Atom, data: Vec<u8> },
}

/// Stateless responder shared by the owner worker and the manager bridge
#[derive(Debug, Clone)]
pub struct SelectionRequestHandler {
    atoms: Atoms,
    converter: LocaleConverter,
}

impl SelectionRequestHandler {
    pub fn new(atoms: Atoms, converter: LocaleConverter) -> Self {
        Self { atoms, converter }
    }

    /// Decide the reply for `target` given the current content
    pub fn decide(&self, target: Atom, content: &ClipboardContent) -> SelectionReply {
        let atoms = &self.atoms;

        if content.is_empty() {
            return SelectionReply::Refuse;
        }

        if target == atoms.TARGETS {
            SelectionReply::Targets(atoms.supported_targets().to_vec())
        } else if target == atoms.SAVE_TARGETS {
            // Supported, nothing to transfer
            SelectionReply::Refuse
        } else if target == atoms.UTF8_STRING {
            SelectionReply::Text {
                kind: atoms.UTF8_STRING,
                data: content.as_bytes().to_vec(),
            }
        } else if target == atoms.STRING {
            match self.converter.convert(content.as_bytes()) {
                Ok(data) => SelectionReply::Text {
                    kind: atoms.STRING,
                    data,
                },
                Err(e) => {
                    tracing::warn!(error = %e, "refusing STRING request");
                    SelectionReply::Refuse
                }
            }
        } else {
            SelectionReply::Refuse
        }
    }

    /// Answer `request` and always send the SelectionNotify back.
    ///
    /// A failure to store the property still produces a refusal notify; only
    /// a failure to send the notify itself is returned.
    pub fn respond<C: Connection>(
        &self,
        conn: &C,
        request: &SelectionRequestEvent,
        content: &ClipboardContent,
    ) -> Result<SelectionReply, ConnectionError> {
        let reply = self.decide(request.target, content);

        let property = reply_property(request.target, request.property);

        let stored = match &reply {
            SelectionReply::Refuse => Ok(false),
            SelectionReply::Targets(targets) => conn
                .change_property32(
                    PropMode::REPLACE,
                    request.requestor,
                    property,
                    AtomEnum::ATOM,
                    targets,
                )
                .map(|_| true),
            SelectionReply::Text { kind, data } => conn
                .change_property8(PropMode::REPLACE, request.requestor, property, *kind, data)
                .map(|_| true),
        };

        if let Err(e) = &stored {
            tracing::warn!(error = %e, requestor = request.requestor, "failed to store selection property");
        }
        let notify_property = notify_property(property, &stored);

        let notify = SelectionNotifyEvent {
            response_type: SELECTION_NOTIFY_EVENT,
            sequence: 0,
            time: request.time,
            requestor: request.requestor,
            selection: request.selection,
            target: request.target,
            property: notify_property,
        };
        conn.send_event(false, request.requestor, EventMask::NO_EVENT, notify)?;
        conn.flush()?;

        tracing::debug!(
            requestor = request.requestor,
            target = request.target,
            refused = notify_property == NONE,
            "answered selection request"
        );
        Ok(reply)
    }
}

/// Property the reply is stored in. Obsolete clients leave it empty and
/// expect the target name.
fn reply_property(target: Atom, requested: Atom) -> Atom {
    if requested == NONE {
        target
    } else {
        requested
    }
}

/// Property reported in the SelectionNotify: the stored one, or `None` when
/// nothing was stored
fn notify_property(property: Atom, stored: &Result<bool, ConnectionError>) -> Atom {
    match stored {
        Ok(true) => property,
        Ok(false) | Err(_) => NONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atoms() -> Atoms {
        Atoms {
            CLIPBOARD: 100,
            CLIPBOARD_MANAGER: 101,
            UTF8_STRING: 102,
            STRING: 31,
            TARGETS: 103,
            SAVE_TARGETS: 104,
            CLIPKEEP_STORE: 105,
        }
    }

    fn handler() -> SelectionRequestHandler {
        SelectionRequestHandler::new(atoms(), LocaleConverter::new("UTF-8", 32))
    }

    fn content(text: &str) -> ClipboardContent {
        ClipboardContent::from_text(text).unwrap()
    }

    #[test]
    fn empty_content_refuses_every_target() {
        let handler = handler();
        let empty = ClipboardContent::empty();
        for target in [103, 104, 102, 31, 999, NONE] {
            assert_eq!(handler.decide(target, &empty), SelectionReply::Refuse);
        }
    }

    #[test]
    fn targets_lists_three_formats_in_order() {
        let handler = handler();
        assert_eq!(
            handler.decide(atoms().TARGETS, &content("x")),
            SelectionReply::Targets(vec![102, 31, 104])
        );
    }

    #[test]
    fn save_targets_is_acknowledged_with_refusal() {
        let handler = handler();
        assert_eq!(
            handler.decide(atoms().SAVE_TARGETS, &content("x")),
            SelectionReply::Refuse
        );
    }

    #[test]
    fn utf8_request_gets_verbatim_bytes() {
        let handler = handler();
        let text = "This is a test.";
        assert_eq!(
            handler.decide(atoms().UTF8_STRING, &content(text)),
            SelectionReply::Text {
                kind: 102,
                data: text.as_bytes().to_vec()
            }
        );
    }

    #[test]
    fn string_request_is_converted_to_locale_charset() {
        let handler =
            SelectionRequestHandler::new(atoms(), LocaleConverter::new("ISO-8859-1", 2));
        assert_eq!(
            handler.decide(atoms().STRING, &content("Buckel-ß")),
            SelectionReply::Text {
                kind: 31,
                data: b"Buckel-\xdf".to_vec()
            }
        );
    }

    #[test]
    fn unconvertible_string_request_is_refused() {
        let handler =
            SelectionRequestHandler::new(atoms(), LocaleConverter::new("ISO-8859-1", 32));
        assert_eq!(
            handler.decide(atoms().STRING, &content("greek β")),
            SelectionReply::Refuse
        );
    }

    #[test]
    fn unknown_target_is_refused() {
        let handler = handler();
        assert_eq!(handler.decide(4242, &content("x")), SelectionReply::Refuse);
    }

    #[test]
    fn requested_property_is_used() {
        assert_eq!(reply_property(atoms().UTF8_STRING, 500), 500);
    }

    #[test]
    fn missing_property_falls_back_to_target() {
        assert_eq!(reply_property(atoms().UTF8_STRING, NONE), atoms().UTF8_STRING);
    }

    #[test]
    fn refusal_notifies_none() {
        assert_eq!(notify_property(500, &Ok(false)), NONE);
    }

    #[test]
    fn stored_reply_notifies_its_property() {
        assert_eq!(notify_property(500, &Ok(true)), 500);
        let fallback = reply_property(atoms().STRING, NONE);
        assert_eq!(notify_property(fallback, &Ok(true)), atoms().STRING);
    }

    #[test]
    fn failed_store_notifies_none() {
        let stored = Err(ConnectionError::UnknownError);
        assert_eq!(notify_property(500, &stored), NONE);
    }
}
