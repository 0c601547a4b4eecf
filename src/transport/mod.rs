//! Network transport seam
//!
//! A transport turns [`RequestParams`] into a running request and reports its
//! progress as an ordered stream of [`TransportEvent`]s: at most one
//! `Response`, then any number of `Data` chunks, then exactly one of `End` or
//! `Error`. The crawler never looks past this interface.

mod http;
#[cfg(test)]
pub(crate) mod scripted;

pub use http::{build_http_client, HttpTransport};

use crate::target::{HeaderSet, RequestParams};
use crate::TransportError;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

static NEXT_OPERATION_ID: AtomicU64 = AtomicU64::new(1);

/// Response metadata delivered once the status line and headers arrive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    /// HTTP status code
    pub status: u16,

    /// URL the response was served from
    pub url: String,

    /// Response headers, names lowercased
    pub headers: HeaderSet,
}

impl ResponseMeta {
    /// Returns the Content-Type header, if present
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// Returns true for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One event emitted by a running operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Status line and headers received
    Response(ResponseMeta),

    /// A chunk of the response body
    Data(Vec<u8>),

    /// The body finished normally
    End,

    /// The operation failed; no further events follow
    Error(TransportError),
}

impl TransportEvent {
    /// Returns true if no event may follow this one
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End | Self::Error(_))
    }
}

/// Handle to one dispatched request
///
/// The crawler owns the handle for the life of the operation and drains its
/// events; hooks only ever see it by reference.
#[derive(Debug)]
pub struct OperationHandle {
    id: u64,
    params: RequestParams,
    events: mpsc::UnboundedReceiver<TransportEvent>,
}

impl OperationHandle {
    /// Creates a handle for the given parameters and the sender its transport feeds
    pub fn channel(params: RequestParams) -> (Self, EventSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Self {
            id: NEXT_OPERATION_ID.fetch_add(1, Ordering::Relaxed),
            params,
            events: rx,
        };
        (handle, EventSender { tx })
    }

    /// Process-unique operation id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The parameters the request was dispatched with
    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    /// Waits for the next event
    ///
    /// Returns `None` once the transport side has gone away.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }
}

/// Transport side of an [`OperationHandle`]
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<TransportEvent>,
}

impl EventSender {
    /// Delivers an event; returns false if the handle was dropped
    pub fn send(&self, event: TransportEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Starts network operations
///
/// `open` must return promptly: the request itself runs in the background
/// (typically a spawned task) and reports through the handle. An `Err` means
/// the request could not even be started.
pub trait Transport: Send + Sync {
    fn open(&self, params: RequestParams) -> Result<OperationHandle, TransportError>;
}
