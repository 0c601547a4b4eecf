//! In-memory transport that replays scripted event sequences

use super::{OperationHandle, ResponseMeta, Transport, TransportEvent};
use crate::target::{HeaderSet, RequestParams};
use crate::TransportError;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Script {
    Events { delay: Duration, events: Vec<TransportEvent> },
    Refuse(String),
}

/// Replays a fixed event sequence per URL, pausing `delay` before each event
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<String, Script>>,
    opened: Mutex<Vec<RequestParams>>,
}

pub(crate) fn ok_response(url: &str) -> ResponseMeta {
    let mut headers = HeaderSet::new();
    headers.insert("content-type".to_string(), "text/html".to_string());
    ResponseMeta {
        status: 200,
        url: url.to_string(),
        headers,
    }
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A successful page whose body arrives as the given chunks
    pub(crate) fn page(self, url: &str, delay_ms: u64, chunks: &[&str]) -> Self {
        let mut events = vec![TransportEvent::Response(ok_response(url))];
        events.extend(chunks.iter().map(|c| TransportEvent::Data(c.as_bytes().to_vec())));
        events.push(TransportEvent::End);
        self.script(url, delay_ms, events)
    }

    /// Headers and some data, then a transport error
    pub(crate) fn fail(self, url: &str, delay_ms: u64, message: &str) -> Self {
        let events = vec![
            TransportEvent::Response(ok_response(url)),
            TransportEvent::Data(b"<html>".to_vec()),
            TransportEvent::Error(TransportError::Request(message.to_string())),
        ];
        self.script(url, delay_ms, events)
    }

    /// `open` itself fails for this URL
    pub(crate) fn refuse(self, url: &str, message: &str) -> Self {
        self.insert(url, Script::Refuse(message.to_string()))
    }

    pub(crate) fn script(self, url: &str, delay_ms: u64, events: Vec<TransportEvent>) -> Self {
        let delay = Duration::from_millis(delay_ms);
        self.insert(url, Script::Events { delay, events })
    }

    fn insert(self, url: &str, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), script);
        self
    }

    /// Parameters of every successful `open`, in call order
    pub(crate) fn opened(&self) -> Vec<RequestParams> {
        self.opened.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn open(&self, params: RequestParams) -> Result<OperationHandle, TransportError> {
        let url = params
            .url()
            .map_err(|e| TransportError::InvalidParams(e.to_string()))?
            .to_string();

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Script::Events {
                delay: Duration::ZERO,
                events: vec![
                    TransportEvent::Response(ok_response(&url)),
                    TransportEvent::Data(b"<html></html>".to_vec()),
                    TransportEvent::End,
                ],
            });

        let (delay, events) = match script {
            Script::Refuse(message) => return Err(TransportError::InvalidParams(message)),
            Script::Events { delay, events } => (delay, events),
        };

        self.opened.lock().unwrap().push(params.clone());
        let (handle, sender) = OperationHandle::channel(params);

        tokio::spawn(async move {
            for event in events {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if !sender.send(event) {
                    return;
                }
            }
        });

        Ok(handle)
    }
}

/// Hands out operations whose events the test sends by hand
#[derive(Debug, Default)]
pub(crate) struct ManualTransport {
    senders: Mutex<Vec<super::EventSender>>,
}

impl ManualTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn opened(&self) -> usize {
        self.senders.lock().unwrap().len()
    }

    /// Sender for the `index`-th opened operation
    pub(crate) fn sender(&self, index: usize) -> super::EventSender {
        self.senders.lock().unwrap()[index].clone()
    }
}

impl Transport for ManualTransport {
    fn open(&self, params: RequestParams) -> Result<OperationHandle, TransportError> {
        let (handle, sender) = OperationHandle::channel(params);
        self.senders.lock().unwrap().push(sender);
        Ok(handle)
    }
}
