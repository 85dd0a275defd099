#![forbid(unsafe_code)]

//! Envelopes, purposes and request ids.
//!
//! Every message crossing the frame boundary is wrapped in an [`Envelope`]:
//!
//! ```json
//! {"busId":"dmn-1","purpose":"request","requestId":7,"payload":{"type":"undo","target":"edit#3"}}
//! ```
//!
//! Requests expect exactly one response with the same `requestId`;
//! notifications expect nothing.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Identifier pairing a request with its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic request id generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestIdGen(u64);

impl RequestIdGen {
    /// Creates a generator whose first id is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Generates the next id.
    #[allow(clippy::should_implement_trait, reason = "convention")]
    pub fn next(&mut self) -> RequestId {
        self.0 += 1;
        RequestId(self.0)
    }

    /// The most recently generated id, if any.
    #[must_use]
    pub fn last(&self) -> Option<RequestId> {
        (self.0 > 0).then_some(RequestId(self.0))
    }
}

/// What the receiver is expected to do with an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    /// Expects one response carrying the same request id.
    Request,
    /// Answers an earlier request.
    Response,
    /// Fire-and-forget.
    Notification,
}

/// One message on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    /// Bus the message belongs to; receivers drop envelopes for other buses.
    pub bus_id: String,
    pub purpose: Purpose,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Wrap a request.
    #[must_use]
    pub fn request(bus_id: impl Into<String>, id: RequestId, payload: T) -> Self {
        Self {
            bus_id: bus_id.into(),
            purpose: Purpose::Request,
            request_id: Some(id),
            payload,
        }
    }

    /// Wrap a response to request `id`.
    #[must_use]
    pub fn response(bus_id: impl Into<String>, id: RequestId, payload: T) -> Self {
        Self {
            bus_id: bus_id.into(),
            purpose: Purpose::Response,
            request_id: Some(id),
            payload,
        }
    }

    /// Wrap a notification.
    #[must_use]
    pub fn notification(bus_id: impl Into<String>, payload: T) -> Self {
        Self {
            bus_id: bus_id.into(),
            purpose: Purpose::Notification,
            request_id: None,
            payload,
        }
    }

    /// Whether this envelope travels on `bus_id`.
    #[must_use]
    pub fn is_for(&self, bus_id: &str) -> bool {
        self.bus_id == bus_id
    }
}

impl<T: Serialize> Envelope<T> {
    /// Encode as a JSON string.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decode from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, ProtocolError> {
        let envelope: Self = serde_json::from_str(s).map_err(ProtocolError::Decode)?;
        match (envelope.purpose, envelope.request_id) {
            (Purpose::Request | Purpose::Response, None) => {
                Err(ProtocolError::MissingRequestId(envelope.purpose))
            }
            _ => Ok(envelope),
        }
    }
}

/// Errors from encoding or decoding envelopes.
#[derive(Debug)]
pub enum ProtocolError {
    /// JSON serialization failed.
    Encode(serde_json::Error),
    /// JSON did not match the envelope schema.
    Decode(serde_json::Error),
    /// A request or response arrived without a request id.
    MissingRequestId(Purpose),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(e) => write!(f, "envelope encode error: {e}"),
            Self::Decode(e) => write!(f, "envelope decode error: {e}"),
            Self::MissingRequestId(purpose) => {
                write!(f, "{purpose:?} envelope without request id")
            }
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(e) | Self::Decode(e) => Some(e),
            Self::MissingRequestId(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::HostMessage;
    use pretty_assertions::assert_eq;

    #[test]
    fn ids_are_monotonic_from_one() {
        let mut ids = RequestIdGen::new();
        assert_eq!(ids.last(), None);
        assert_eq!(ids.next(), RequestId(1));
        assert_eq!(ids.next(), RequestId(2));
        assert_eq!(ids.last(), Some(RequestId(2)));
    }

    #[test]
    fn request_json_shape() {
        let envelope = Envelope::request("bus", RequestId(7), HostMessage::RequestContent);
        assert_eq!(
            envelope.to_json().unwrap(),
            r#"{"busId":"bus","purpose":"request","requestId":7,"payload":{"type":"request_content"}}"#
        );
    }

    #[test]
    fn notification_omits_request_id() {
        let envelope = Envelope::notification(
            "bus",
            HostMessage::LocaleChange {
                locale: "pt-BR".into(),
            },
        );
        let json = envelope.to_json().unwrap();
        assert!(!json.contains("requestId"));
        let back: Envelope<HostMessage> = Envelope::from_json(&json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn request_without_id_is_rejected() {
        let json = r#"{"busId":"bus","purpose":"request","payload":{"type":"request_preview"}}"#;
        let err = Envelope::<HostMessage>::from_json(json).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingRequestId(Purpose::Request)));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = Envelope::<HostMessage>::from_json("{not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
        assert!(err.to_string().starts_with("envelope decode error"));
    }

    #[test]
    fn bus_filter() {
        let envelope = Envelope::notification("a", HostMessage::RequestPreview);
        assert!(envelope.is_for("a"));
        assert!(!envelope.is_for("b"));
    }
}
