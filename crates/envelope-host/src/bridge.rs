#![forbid(unsafe_code)]

//! Host half of the editor bridge.
//!
//! [`SyncBridge`] owns the session's [`StateControl`] and is the only thing
//! that mutates it. Edits reported by the editor are appended; host
//! undo/redo moves the history first and then asks the editor to follow.
//! The toolbar is computed from the history alone, so it may run one round
//! trip ahead of what the editor shows ([`BridgeView::rendered`]).
//!
//! Nothing the editor does can make a bridge call fail. Lost frames, closed
//! channels, refused content and refused steps turn into [`EditorStatus`]
//! changes, [`BridgeFailure`] results for deferred callbacks, or
//! [`SyncBridge::last_error`].
//!
//! # Loading content
//!
//! [`SyncBridge::set_content`] leaves the history alone until the editor
//! acknowledges the load. A `set_content_error` that arrives first marks the
//! load as refused: the editor kept its document, so the history, the saved
//! marker and `rendered` are kept as well.
//!
//! # Message arrival
//!
//! Responses are matched by request id, never by arrival order. An
//! acknowledgement only moves `rendered` if it is newer than everything
//! applied since; an edit reported by the editor counts as newer than every
//! request sent before it.

use std::collections::BTreeMap;
use std::fmt;

use envelope_history::{EventId, HistoryConfig, StateControl, SubscriberId, ToolbarState};
use envelope_protocol::{
    ChannelKeyboardEvent, EditorMessage, Envelope, FileType, HostMessage, ProtocolError,
    Purpose, RequestId, RequestIdGen, Transport,
};
use tracing::{debug, trace, warn};

use crate::config::HostConfig;
use crate::locale::{LocaleChange, LocaleNegotiator};

const TARGET: &str = "envelope.bridge";

/// Baseline event for content the editor opened on its own.
const OPEN_BASELINE: &str = "open#0";

/// Where the editor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorStatus {
    /// Mounted, not yet announced ready.
    Loading,
    Ready,
    /// The editor refused an undo or redo the history had already made, so
    /// the toolbar no longer describes what the editor shows. Cleared by the
    /// next accepted load or ready announcement.
    OutOfSync,
    /// The channel to the editor is gone.
    Unavailable,
}

/// Why a deferred request produced no answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeFailure {
    /// The editor went away before answering.
    EditorUnavailable,
    /// The editor was remounted before answering.
    Remounted,
    /// The editor answered with the wrong kind of response.
    UnexpectedResponse(&'static str),
}

impl fmt::Display for BridgeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EditorUnavailable => f.write_str("editor unavailable"),
            Self::Remounted => f.write_str("editor remounted before answering"),
            Self::UnexpectedResponse(name) => write!(f, "unexpected '{name}' response"),
        }
    }
}

impl std::error::Error for BridgeFailure {}

type ContentCallback = Box<dyn FnOnce(Result<String, BridgeFailure>)>;
type PreviewCallback = Box<dyn FnOnce(Result<Option<String>, BridgeFailure>)>;

enum Pending {
    Navigate { target: EventId },
    SetContent { baseline: EventId, refused: bool },
    Content(ContentCallback),
    Preview(PreviewCallback),
}

impl Pending {
    fn fail(self, failure: BridgeFailure) {
        match self {
            Self::Content(callback) => callback(Err(failure)),
            Self::Preview(callback) => callback(Err(failure)),
            Self::Navigate { .. } | Self::SetContent { .. } => {}
        }
    }
}

/// What the host UI renders from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeView {
    pub toolbar: ToolbarState,
    /// Position the editor last confirmed it shows.
    pub rendered: Option<EventId>,
    /// Requests sent and not yet answered.
    pub in_flight: usize,
    pub editor_status: EditorStatus,
    /// The locale changed and the editor must be remounted.
    pub reset_required: bool,
}

/// Synchronizes one editor session with its host history.
pub struct SyncBridge<T> {
    bus_id: String,
    transport: T,
    history: StateControl,
    ids: RequestIdGen,
    pending: BTreeMap<RequestId, Pending>,
    edit_seq: u64,
    load_seq: u64,
    status: EditorStatus,
    file_type: Option<FileType>,
    rendered: Option<EventId>,
    newest_applied: RequestId,
    locale: LocaleNegotiator,
    reset_required: bool,
    last_error: Option<String>,
}

impl<T: Transport<HostMessage>> SyncBridge<T> {
    /// Bridge with default history limits and an English-only locale set.
    pub fn new(bus_id: impl Into<String>, transport: T) -> Self {
        Self::with_parts(
            bus_id,
            transport,
            HistoryConfig::default(),
            LocaleNegotiator::new("en", ["en"]),
        )
    }

    /// Bridge configured from a host configuration.
    pub fn with_config(bus_id: impl Into<String>, transport: T, config: &HostConfig) -> Self {
        Self::with_parts(
            bus_id,
            transport,
            config.to_history_config(),
            LocaleNegotiator::from_config(&config.locale),
        )
    }

    pub fn with_parts(
        bus_id: impl Into<String>,
        transport: T,
        history: HistoryConfig,
        locale: LocaleNegotiator,
    ) -> Self {
        Self {
            bus_id: bus_id.into(),
            transport,
            history: StateControl::new(history),
            ids: RequestIdGen::new(),
            pending: BTreeMap::new(),
            edit_seq: 0,
            load_seq: 0,
            status: EditorStatus::Loading,
            file_type: None,
            rendered: None,
            newest_applied: RequestId(0),
            locale,
            reset_required: false,
            last_error: None,
        }
    }

    // ========================================================================
    // Host commands
    // ========================================================================

    /// Undo one edit. Returns `false` if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(target) = self.history.undo() else {
            return false;
        };
        self.request(
            HostMessage::Undo {
                target: Some(target.clone()),
            },
            Pending::Navigate { target },
        );
        true
    }

    /// Redo one edit. Returns `false` if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(target) = self.history.redo() else {
            return false;
        };
        self.request(
            HostMessage::Redo {
                target: Some(target.clone()),
            },
            Pending::Navigate { target },
        );
        true
    }

    /// The document was persisted at the current position.
    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }

    /// The document was persisted at `event`.
    pub fn set_saved(&mut self, event: impl Into<Option<EventId>>) {
        self.history.set_saved(event);
    }

    /// Load new content into the editor. The history restarts from it once
    /// the editor acknowledges the load without refusing it.
    pub fn set_content(&mut self, path: &str, content: &str) {
        self.load_seq += 1;
        let baseline = EventId::new(format!("load#{}", self.load_seq));
        self.last_error = None;
        self.request(
            HostMessage::SetContent {
                path: path.to_owned(),
                content: content.to_owned(),
            },
            Pending::SetContent {
                baseline,
                refused: false,
            },
        );
    }

    /// Ask for the editor's current content.
    pub fn request_content(
        &mut self,
        callback: impl FnOnce(Result<String, BridgeFailure>) + 'static,
    ) {
        self.request(HostMessage::RequestContent, Pending::Content(Box::new(callback)));
    }

    /// Ask for an SVG preview. Editors without previews answer `None`.
    pub fn request_preview(
        &mut self,
        callback: impl FnOnce(Result<Option<String>, BridgeFailure>) + 'static,
    ) {
        self.request(HostMessage::RequestPreview, Pending::Preview(Box::new(callback)));
    }

    /// Switch locale. A different resolved locale is forwarded to the
    /// editor, which cannot apply it without a remount.
    pub fn change_locale(&mut self, requested: &str) -> LocaleChange {
        let change = self.locale.change(requested);
        if let LocaleChange::RemountRequired { locale } = &change {
            self.notify(HostMessage::LocaleChange {
                locale: locale.clone(),
            });
        }
        change
    }

    /// Forward a host keyboard event. No reply is expected.
    pub fn forward_keyboard(&mut self, event: ChannelKeyboardEvent) {
        if self.status == EditorStatus::Unavailable {
            trace!(
                target: TARGET,
                code = %event.code,
                "keyboard event dropped: editor unavailable"
            );
            return;
        }
        self.notify(HostMessage::KeyboardEvent { event });
    }

    /// The user confirmed the editor reset after a locale change.
    pub fn acknowledge_reset(&mut self) {
        self.reset_required = false;
    }

    // ========================================================================
    // Editor lifecycle
    // ========================================================================

    /// The editor frame is gone. Pending requests fail.
    pub fn editor_unavailable(&mut self) {
        warn!(
            target: TARGET,
            bus = %self.bus_id,
            in_flight = self.pending.len(),
            "editor unavailable"
        );
        self.status = EditorStatus::Unavailable;
        self.fail_pending(BridgeFailure::EditorUnavailable);
    }

    /// A fresh editor instance was mounted and has not announced itself yet.
    pub fn editor_remounted(&mut self) {
        debug!(target: TARGET, bus = %self.bus_id, "editor remounted");
        self.status = EditorStatus::Loading;
        self.rendered = None;
        self.reset_required = false;
        self.fail_pending(BridgeFailure::Remounted);
    }

    // ========================================================================
    // Editor messages
    // ========================================================================

    /// Decode and handle one JSON envelope from the editor.
    pub fn receive_json(&mut self, json: &str) -> Result<(), ProtocolError> {
        let envelope = Envelope::<EditorMessage>::from_json(json)?;
        self.receive(envelope);
        Ok(())
    }

    /// Handle one envelope from the editor.
    pub fn receive(&mut self, envelope: Envelope<EditorMessage>) {
        if !envelope.is_for(&self.bus_id) {
            trace!(target: TARGET, bus = %envelope.bus_id, "envelope for another bus");
            return;
        }
        if envelope.purpose == Purpose::Response {
            match envelope.request_id {
                Some(id) => self.on_response(id, envelope.payload),
                None => {
                    warn!(target: TARGET, message = envelope.payload.name(), "response without id");
                }
            }
            return;
        }

        match envelope.payload {
            EditorMessage::Ready { file_type, locale } => {
                debug!(target: TARGET, %file_type, locale = %locale, "editor ready");
                if locale != self.locale.current() {
                    warn!(
                        target: TARGET,
                        editor = %locale,
                        host = %self.locale.current(),
                        "editor mounted with another locale"
                    );
                }
                self.status = EditorStatus::Ready;
                self.file_type = Some(file_type);
                let baseline = EventId::new(OPEN_BASELINE);
                self.history.reset_to(baseline.clone());
                self.rendered = Some(baseline);
                self.newest_applied = self.ids.last().unwrap_or(RequestId(0));
            }
            EditorMessage::NewEdit { edit_id } => {
                self.edit_seq += 1;
                let event = EventId::new(format!("{edit_id}#{}", self.edit_seq));
                self.history.append_event(event.clone());
                self.rendered = Some(event);
                // The editor already shows this edit; acks for earlier
                // requests must not move `rendered` back.
                self.newest_applied = self.ids.last().unwrap_or(RequestId(0));
            }
            EditorMessage::SetContentError { message } => {
                warn!(target: TARGET, error = %message, "editor refused content");
                self.refuse_latest_load();
                self.last_error = Some(message);
            }
            EditorMessage::LocaleAccepted { locale } => {
                if locale == self.locale.current() {
                    debug!(target: TARGET, locale = %locale, "locale accepted, reset required");
                    self.reset_required = true;
                } else {
                    trace!(target: TARGET, locale = %locale, "stale locale acceptance");
                }
            }
            other => {
                warn!(target: TARGET, message = other.name(), "response sent as notification");
            }
        }
    }

    fn on_response(&mut self, id: RequestId, message: EditorMessage) {
        let Some(pending) = self.pending.remove(&id) else {
            trace!(target: TARGET, request = %id, "response to unknown request");
            return;
        };
        match (pending, message) {
            (Pending::Navigate { target }, EditorMessage::Ack) => self.apply_ack(id, target),
            (Pending::Navigate { target }, EditorMessage::NotMoved) => {
                warn!(
                    target: TARGET,
                    request = %id,
                    position = %target,
                    "editor did not follow the history"
                );
                self.status = EditorStatus::OutOfSync;
            }
            (Pending::SetContent { baseline, refused }, EditorMessage::Ack) => {
                if refused {
                    debug!(
                        target: TARGET,
                        request = %id,
                        baseline = %baseline,
                        "load refused, history kept"
                    );
                } else {
                    self.content_loaded(id, baseline);
                }
            }
            (Pending::Content(callback), EditorMessage::Content { content }) => {
                callback(Ok(content));
            }
            (Pending::Preview(callback), EditorMessage::Preview { svg }) => callback(Ok(svg)),
            (pending, other) => {
                warn!(target: TARGET, request = %id, message = other.name(), "mismatched response");
                pending.fail(BridgeFailure::UnexpectedResponse(other.name()));
            }
        }
    }

    /// The editor now shows `baseline` and nothing else. Steps sent before
    /// the load was confirmed refer to the replaced history.
    fn content_loaded(&mut self, id: RequestId, baseline: EventId) {
        debug!(target: TARGET, request = %id, baseline = %baseline, "editor loaded content");
        self.history.reset_to(baseline.clone());
        self.rendered = Some(baseline);
        self.newest_applied = self.newest_applied.max(id);
        self.pending.retain(|_, pending| !matches!(pending, Pending::Navigate { .. }));
        if self.status == EditorStatus::OutOfSync {
            self.status = EditorStatus::Ready;
        }
    }

    /// Errors carry no request id; the editor reports them right before
    /// acknowledging the load they belong to, which is the newest one.
    fn refuse_latest_load(&mut self) {
        let latest = self
            .pending
            .values_mut()
            .rev()
            .find_map(|pending| match pending {
                Pending::SetContent { refused, .. } => Some(refused),
                _ => None,
            });
        if let Some(refused) = latest {
            *refused = true;
        }
    }

    fn apply_ack(&mut self, id: RequestId, position: EventId) {
        if id <= self.newest_applied {
            trace!(target: TARGET, request = %id, "stale acknowledgement");
            return;
        }
        self.newest_applied = id;
        debug!(target: TARGET, request = %id, rendered = %position, "editor caught up");
        self.rendered = Some(position);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Snapshot for the host UI.
    #[must_use]
    pub fn view(&self) -> BridgeView {
        BridgeView {
            toolbar: self.history.toolbar(),
            rendered: self.rendered.clone(),
            in_flight: self.pending.len(),
            editor_status: self.status,
            reset_required: self.reset_required,
        }
    }

    #[must_use]
    pub fn history(&self) -> &StateControl {
        &self.history
    }

    /// Register a dirty-state observer on the session history.
    pub fn subscribe(
        &mut self,
        id: impl Into<SubscriberId>,
        callback: impl FnMut(bool) + 'static,
    ) -> bool {
        self.history.subscribe(id, callback)
    }

    pub fn unsubscribe(&mut self, id: &str) -> bool {
        self.history.unsubscribe(id)
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.history.is_dirty()
    }

    #[must_use]
    pub fn editor_status(&self) -> EditorStatus {
        self.status
    }

    /// File type the editor announced.
    #[must_use]
    pub fn file_type(&self) -> Option<FileType> {
        self.file_type
    }

    #[must_use]
    pub fn rendered(&self) -> Option<&EventId> {
        self.rendered.as_ref()
    }

    /// Last content error reported by the editor.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn locale(&self) -> &str {
        self.locale.current()
    }

    #[must_use]
    pub fn bus_id(&self) -> &str {
        &self.bus_id
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn request(&mut self, message: HostMessage, pending: Pending) {
        if self.status == EditorStatus::Unavailable {
            trace!(
                target: TARGET,
                message = message.name(),
                "request dropped: editor unavailable"
            );
            pending.fail(BridgeFailure::EditorUnavailable);
            return;
        }
        let id = self.ids.next();
        let name = message.name();
        match self.transport.post(Envelope::request(self.bus_id.clone(), id, message)) {
            Ok(()) => {
                trace!(target: TARGET, request = %id, message = name, "request sent");
                self.pending.insert(id, pending);
            }
            Err(err) => {
                warn!(target: TARGET, message = name, error = %err, "request could not be sent");
                pending.fail(BridgeFailure::EditorUnavailable);
                self.editor_unavailable();
            }
        }
    }

    fn notify(&mut self, message: HostMessage) {
        let name = message.name();
        let envelope = Envelope::notification(self.bus_id.clone(), message);
        if let Err(err) = self.transport.post(envelope) {
            warn!(target: TARGET, message = name, error = %err, "notification could not be sent");
            self.editor_unavailable();
        }
    }

    fn fail_pending(&mut self, failure: BridgeFailure) {
        for (_, pending) in std::mem::take(&mut self.pending) {
            pending.fail(failure.clone());
        }
    }
}
