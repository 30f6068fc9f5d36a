//! In-memory doubles for exercising handlers without network access.
//!
//! Compiled for the crate's own tests and for downstream crates enabling
//! the `test-util` feature.

use std::any::Any;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::discord_handler::{TransportError, WebhookRequest, WebhookTransport};
use crate::handler::{Handler, HandlerError};
use crate::log_record::LogRecord;

type ExecuteCallback = Arc<dyn Fn(&WebhookRequest) + Send + Sync>;
type ReplyFactory = Box<dyn FnMut() -> Result<(), TransportError> + Send>;

/// Transport recording every request it is asked to execute.
///
/// Replies are taken from a queue; once it is empty every request succeeds.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    requests: Arc<Mutex<Vec<WebhookRequest>>>,
    replies: Arc<Mutex<VecDeque<ReplyFactory>>>,
    on_execute: Option<ExecuteCallback>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next unanswered request.
    pub fn push_reply<F>(&self, reply: F)
    where
        F: FnMut() -> Result<(), TransportError> + Send + 'static,
    {
        self.replies.lock().push_back(Box::new(reply));
    }

    /// Queue a failure with the given HTTP status.
    pub fn push_status(&self, status: u16, body: &str) {
        let body = body.to_owned();
        self.push_reply(move || {
            Err(TransportError::Status {
                status,
                body: body.clone(),
            })
        });
    }

    /// Run `callback` inside every `execute`, before the reply is produced.
    pub fn on_execute<F>(mut self, callback: F) -> Self
    where
        F: Fn(&WebhookRequest) + Send + Sync + 'static,
    {
        self.on_execute = Some(Arc::new(callback));
        self
    }

    /// Snapshot of the requests executed so far.
    pub fn requests(&self) -> Vec<WebhookRequest> {
        self.requests.lock().clone()
    }
}

impl WebhookTransport for RecordingTransport {
    fn execute(&self, request: &WebhookRequest) -> Result<(), TransportError> {
        self.requests.lock().push(request.clone());
        if let Some(callback) = &self.on_execute {
            callback(request);
        }
        let reply = self.replies.lock().pop_front();
        match reply {
            Some(mut reply) => reply(),
            None => Ok(()),
        }
    }
}

/// Handler collecting every record it receives.
#[derive(Clone, Default)]
pub struct CollectingHandler {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl CollectingHandler {
    pub fn collected(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.message.clone()).collect()
    }
}

impl Handler for CollectingHandler {
    fn handle(&self, record: LogRecord) -> Result<(), HandlerError> {
        self.records.lock().push(record);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Thread-safe byte buffer for capturing handler output and diagnostics.
///
/// Clones share the same buffer, so one clone can be handed to a handler
/// while the test keeps the other.
#[derive(Clone, Default)]
pub struct SharedBuf {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuf {
    /// Buffer contents as text. Invalid UTF-8 is replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_owned).collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
