#![forbid(unsafe_code)]

//! Outbound channels.
//!
//! Senders never block. A [`Transport`] either accepts an envelope or says
//! why it cannot; the in-memory [`Outbox`] accepts everything until it is
//! closed and lets the embedding drain messages on its own schedule. Queue
//! depth and overflow belong to whoever drains it.

use std::collections::VecDeque;
use std::fmt;

use crate::envelope::Envelope;

/// Why an envelope could not be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The other side went away (frame unloaded, webview disposed).
    Closed,
    /// The channel refused the message.
    Rejected(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("transport closed"),
            Self::Rejected(reason) => write!(f, "transport rejected message: {reason}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// One-way channel for envelopes carrying `M`.
pub trait Transport<M> {
    /// Hand an envelope to the channel without waiting for delivery.
    fn post(&mut self, envelope: Envelope<M>) -> Result<(), TransportError>;
}

/// Unbounded in-memory queue drained by the embedding.
#[derive(Debug, Clone)]
pub struct Outbox<M> {
    queue: VecDeque<Envelope<M>>,
    closed: bool,
    posted: u64,
}

impl<M> Default for Outbox<M> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            closed: false,
            posted: 0,
        }
    }
}

impl<M> Outbox<M> {
    /// Create an open, empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse further posts. Already queued envelopes stay drainable.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Whether [`close`](Self::close) was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Remove and return the oldest queued envelope.
    pub fn pop(&mut self) -> Option<Envelope<M>> {
        self.queue.pop_front()
    }

    /// Drain all queued envelopes in posting order.
    pub fn drain(&mut self) -> impl Iterator<Item = Envelope<M>> + '_ {
        self.queue.drain(..)
    }

    /// Peek at queued envelopes without removing them.
    pub fn pending(&self) -> impl Iterator<Item = &Envelope<M>> + '_ {
        self.queue.iter()
    }

    /// Number of queued envelopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Envelopes accepted since creation.
    #[must_use]
    pub fn posted(&self) -> u64 {
        self.posted
    }
}

impl<M> Transport<M> for Outbox<M> {
    fn post(&mut self, envelope: Envelope<M>) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.queue.push_back(envelope);
        self.posted += 1;
        Ok(())
    }
}

impl<M, T: Transport<M> + ?Sized> Transport<M> for &mut T {
    fn post(&mut self, envelope: Envelope<M>) -> Result<(), TransportError> {
        (**self).post(envelope)
    }
}

impl<M, T: Transport<M> + ?Sized> Transport<M> for Box<T> {
    fn post(&mut self, envelope: Envelope<M>) -> Result<(), TransportError> {
        (**self).post(envelope)
    }
}
