#![forbid(unsafe_code)]

//! Editor-side message loop.
//!
//! The embedding feeds decoded host envelopes into [`EnvelopeServer::receive`]
//! and drains the transport. Every request gets exactly one response;
//! failures inside the editor become `set_content_error` notifications
//! instead of missing acknowledgements, and an undo or redo with nothing to
//! step over is answered `not_moved` rather than `ack`.

use envelope_protocol::{
    ChannelKeyboardEvent, EditorMessage, Envelope, EventId, HostMessage, ProtocolError, Purpose,
    RequestId, Transport,
};
use tracing::{debug, trace, warn};

use crate::editor::Editor;

const TARGET: &str = "envelope.editor";

type KeyboardHandler = Box<dyn FnMut(&ChannelKeyboardEvent)>;

/// Serves one editor on one bus.
pub struct EnvelopeServer<E, T> {
    bus_id: String,
    editor: E,
    transport: T,
    locale: String,
    pending_locale: Option<String>,
    edit_seq: u64,
    on_keyboard: Option<KeyboardHandler>,
}

impl<E: Editor, T: Transport<EditorMessage>> EnvelopeServer<E, T> {
    /// The locale is fixed for the server's lifetime.
    pub fn new(
        bus_id: impl Into<String>,
        editor: E,
        transport: T,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            bus_id: bus_id.into(),
            editor,
            transport,
            locale: locale.into(),
            pending_locale: None,
            edit_seq: 0,
            on_keyboard: None,
        }
    }

    /// Receive forwarded keyboard events.
    pub fn on_keyboard(&mut self, handler: impl FnMut(&ChannelKeyboardEvent) + 'static) {
        self.on_keyboard = Some(Box::new(handler));
    }

    #[must_use]
    pub fn bus_id(&self) -> &str {
        &self.bus_id
    }

    #[must_use]
    pub fn editor(&self) -> &E {
        &self.editor
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Locale the editor was built with.
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Locale accepted from the host, applied only by a remount.
    #[must_use]
    pub fn pending_locale(&self) -> Option<&str> {
        self.pending_locale.as_deref()
    }

    /// Open the editor and tell the host it can start sending commands.
    pub fn announce_ready(&mut self) {
        self.editor.open();
        let ready = EditorMessage::Ready {
            file_type: self.editor.file_type(),
            locale: self.locale.clone(),
        };
        self.notify(ready);
    }

    /// Run a local user action against the editor and report it as an edit
    /// if it changed the content. Returns the edit id that was sent.
    pub fn local_edit(&mut self, action: impl FnOnce(&mut E)) -> Option<String> {
        let before = self.editor.content();
        action(&mut self.editor);
        if self.editor.content() == before {
            trace!(target: TARGET, "local action produced no edit");
            return None;
        }
        self.edit_seq += 1;
        let edit_id = format!("edit-{}", self.edit_seq);
        debug!(target: TARGET, edit_id = %edit_id, "local edit");
        self.notify(EditorMessage::NewEdit {
            edit_id: edit_id.clone(),
        });
        Some(edit_id)
    }

    /// Decode and handle one JSON envelope.
    pub fn receive_json(&mut self, json: &str) -> Result<(), ProtocolError> {
        let envelope = Envelope::<HostMessage>::from_json(json)?;
        self.receive(envelope);
        Ok(())
    }

    /// Handle one host envelope.
    pub fn receive(&mut self, envelope: Envelope<HostMessage>) {
        if !envelope.is_for(&self.bus_id) {
            trace!(target: TARGET, bus = %envelope.bus_id, "envelope for another bus");
            return;
        }
        let request_id = envelope.request_id;
        let message = envelope.payload;
        if message.purpose() == Purpose::Request && request_id.is_none() {
            warn!(target: TARGET, message = message.name(), "request without id dropped");
            return;
        }
        trace!(target: TARGET, message = message.name(), "host message");

        match message {
            HostMessage::Undo { target } => {
                let moved = self.editor.undo();
                self.navigated(request_id, "undo", moved, target.as_ref());
            }
            HostMessage::Redo { target } => {
                let moved = self.editor.redo();
                self.navigated(request_id, "redo", moved, target.as_ref());
            }
            HostMessage::SetContent { path, content } => {
                if let Err(err) = self.editor.set_content(&path, &content) {
                    warn!(target: TARGET, path = %path, error = %err, "set content failed");
                    self.notify(EditorMessage::SetContentError {
                        message: err.to_string(),
                    });
                }
                self.respond(request_id, EditorMessage::Ack);
            }
            HostMessage::RequestContent => {
                let content = self.editor.content();
                self.respond(request_id, EditorMessage::Content { content });
            }
            HostMessage::RequestPreview => {
                let svg = self.editor.preview();
                self.respond(request_id, EditorMessage::Preview { svg });
            }
            HostMessage::LocaleChange { locale } => self.locale_change(locale),
            HostMessage::KeyboardEvent { event } => {
                if let Some(handler) = self.on_keyboard.as_mut() {
                    handler(&event);
                }
            }
        }
    }

    /// Answer an undo or redo. The host moved its history before asking, so
    /// a step that went nowhere means the two sides disagree.
    fn navigated(
        &mut self,
        request_id: Option<RequestId>,
        action: &'static str,
        moved: bool,
        host_position: Option<&EventId>,
    ) {
        if moved {
            debug!(target: TARGET, action, position = ?host_position, "history step applied");
            self.respond(request_id, EditorMessage::Ack);
        } else {
            warn!(target: TARGET, action, position = ?host_position, "history step went nowhere");
            self.respond(request_id, EditorMessage::NotMoved);
        }
    }

    fn locale_change(&mut self, locale: String) {
        if locale == self.locale {
            trace!(target: TARGET, locale = %locale, "locale unchanged");
            self.pending_locale = None;
            return;
        }
        if self.pending_locale.as_deref() == Some(locale.as_str()) {
            trace!(target: TARGET, locale = %locale, "locale already accepted");
            return;
        }
        debug!(
            target: TARGET,
            from = %self.locale,
            to = %locale,
            "locale accepted, remount required"
        );
        self.pending_locale = Some(locale.clone());
        self.notify(EditorMessage::LocaleAccepted { locale });
    }

    fn respond(&mut self, request_id: Option<RequestId>, message: EditorMessage) {
        let Some(id) = request_id else {
            return;
        };
        let envelope = Envelope::response(self.bus_id.clone(), id, message);
        self.post(envelope);
    }

    fn notify(&mut self, message: EditorMessage) {
        let envelope = Envelope::notification(self.bus_id.clone(), message);
        self.post(envelope);
    }

    fn post(&mut self, envelope: Envelope<EditorMessage>) {
        let name = envelope.payload.name();
        if let Err(err) = self.transport.post(envelope) {
            warn!(target: TARGET, message = name, error = %err, "dropping outbound message");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use envelope_protocol::{FileType, KeyEventType, Modifiers, Outbox, RequestIdGen};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::adapters::{AnyEditor, editor_for};

    const BUS: &str = "bus-1";

    fn server() -> Server {
        EnvelopeServer::new(BUS, editor_for(FileType::Dmn), Outbox::new(), "en")
    }

    type Server = EnvelopeServer<AnyEditor, Outbox<EditorMessage>>;

    fn drain(server: &mut Server) -> Vec<Envelope<EditorMessage>> {
        server.transport_mut().drain().collect()
    }

    fn load(server: &mut Server, ids: &mut RequestIdGen) {
        server.receive(Envelope::request(
            BUS,
            ids.next(),
            HostMessage::SetContent {
                path: "loan.dmn".to_owned(),
                content: "<definitions/>".to_owned(),
            },
        ));
    }

    #[test]
    fn ready_announces_file_type_and_locale() {
        let mut server = server();
        server.announce_ready();
        assert!(server.editor().document().is_open());
        let sent = drain(&mut server);
        assert_eq!(
            sent,
            vec![Envelope::notification(
                BUS,
                EditorMessage::Ready {
                    file_type: FileType::Dmn,
                    locale: "en".to_owned(),
                }
            )]
        );
    }

    #[test]
    fn every_request_is_answered_with_its_id() {
        let mut server = server();
        let mut ids = RequestIdGen::new();
        load(&mut server, &mut ids);
        server.receive(Envelope::request(BUS, ids.next(), HostMessage::Undo { target: None }));
        server.receive(Envelope::request(BUS, ids.next(), HostMessage::RequestContent));
        let sent = drain(&mut server);
        let ids: Vec<_> = sent.iter().map(|e| e.request_id.map(|id| id.0)).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(
            sent[2].payload,
            EditorMessage::Content {
                content: "<definitions/>".to_owned()
            }
        );
    }

    #[test]
    fn bad_content_reports_error_and_still_acks() {
        let mut server = server();
        server.receive(Envelope::request(
            BUS,
            RequestId(9),
            HostMessage::SetContent {
                path: "x.dmn".to_owned(),
                content: "not xml".to_owned(),
            },
        ));
        let sent = drain(&mut server);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].purpose, Purpose::Notification);
        assert!(matches!(
            &sent[0].payload,
            EditorMessage::SetContentError { message } if message.contains("not XML")
        ));
        assert_eq!(sent[1], Envelope::response(BUS, RequestId(9), EditorMessage::Ack));
    }

    #[test]
    fn local_edits_get_sequential_ids() {
        let mut server = server();
        let mut ids = RequestIdGen::new();
        load(&mut server, &mut ids);
        drain(&mut server);

        assert_eq!(
            server.local_edit(|e| {
                e.edit("<definitions name=\"a\"/>");
            }),
            Some("edit-1".to_owned())
        );
        assert_eq!(server.local_edit(|_| {}), None);
        assert_eq!(
            server.local_edit(|e| {
                e.edit("<definitions name=\"b\"/>");
            }),
            Some("edit-2".to_owned())
        );
        let edits: Vec<_> = drain(&mut server).into_iter().map(|e| e.payload).collect();
        assert_eq!(
            edits,
            vec![
                EditorMessage::NewEdit {
                    edit_id: "edit-1".to_owned()
                },
                EditorMessage::NewEdit {
                    edit_id: "edit-2".to_owned()
                },
            ]
        );
    }

    #[test]
    fn undo_from_host_does_not_emit_new_edit() {
        let mut server = server();
        let mut ids = RequestIdGen::new();
        load(&mut server, &mut ids);
        server.local_edit(|e| {
            e.edit("<definitions name=\"a\"/>");
        });
        drain(&mut server);
        server.receive(Envelope::request(BUS, ids.next(), HostMessage::Undo { target: None }));
        assert_eq!(server.editor().content(), "<definitions/>");
        let sent = drain(&mut server);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].payload, EditorMessage::Ack);
    }

    #[test]
    fn step_with_nothing_to_undo_is_not_acknowledged() {
        let mut server = server();
        let mut ids = RequestIdGen::new();
        load(&mut server, &mut ids);
        drain(&mut server);

        let target = Some(EventId::new("load#1"));
        server.receive(Envelope::request(BUS, ids.next(), HostMessage::Undo { target }));
        server.receive(Envelope::request(BUS, ids.next(), HostMessage::Redo { target: None }));
        assert_eq!(
            drain(&mut server),
            vec![
                Envelope::response(BUS, RequestId(2), EditorMessage::NotMoved),
                Envelope::response(BUS, RequestId(3), EditorMessage::NotMoved),
            ]
        );
        assert_eq!(server.editor().content(), "<definitions/>");
    }

    #[test]
    fn locale_is_accepted_but_not_applied() {
        let mut server = server();
        let change = |locale: &str| {
            Envelope::notification(
                BUS,
                HostMessage::LocaleChange {
                    locale: locale.to_owned(),
                },
            )
        };
        server.receive(change("en"));
        server.receive(change("pt"));
        server.receive(change("pt"));
        assert_eq!(server.locale(), "en");
        assert_eq!(server.pending_locale(), Some("pt"));
        let sent = drain(&mut server);
        assert_eq!(
            sent,
            vec![Envelope::notification(
                BUS,
                EditorMessage::LocaleAccepted {
                    locale: "pt".to_owned()
                }
            )]
        );
        server.receive(change("en"));
        assert_eq!(server.pending_locale(), None);
    }

    #[test]
    fn keyboard_events_reach_handler_without_reply() {
        let mut server = server();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        server.on_keyboard(move |event| sink.borrow_mut().push(event.code.clone()));
        let event = ChannelKeyboardEvent::new(KeyEventType::Keydown, "KeyZ")
            .with_modifiers(Modifiers::CTRL);
        server.receive(Envelope::notification(BUS, HostMessage::KeyboardEvent { event }));
        assert_eq!(*seen.borrow(), vec!["KeyZ".to_owned()]);
        assert!(server.transport().is_empty());
    }

    #[test]
    fn foreign_bus_and_idless_requests_are_ignored() {
        let mut server = server();
        server.receive(Envelope::request("other", RequestId(1), HostMessage::RequestContent));
        let mut idless = Envelope::notification(BUS, HostMessage::RequestContent);
        idless.purpose = Purpose::Request;
        server.receive(idless);
        assert!(server.transport().is_empty());
    }

    #[test]
    fn closed_transport_does_not_panic() {
        let mut server = server();
        server.transport_mut().close();
        server.announce_ready();
        server.receive(Envelope::request(BUS, RequestId(1), HostMessage::RequestPreview));
        assert!(server.transport().is_empty());
    }

    #[test]
    fn receive_json_surfaces_decode_errors() {
        let mut server = server();
        assert!(server.receive_json("{").is_err());
        let json = Envelope::request(BUS, RequestId(4), HostMessage::RequestPreview)
            .to_json()
            .unwrap();
        server.receive_json(&json).unwrap();
        let sent = drain(&mut server);
        assert_eq!(
            sent,
            vec![Envelope::response(BUS, RequestId(4), EditorMessage::Preview { svg: None })]
        );
    }
}
