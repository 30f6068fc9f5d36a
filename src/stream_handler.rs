//! Stream-based logging handler implementation.
//!
//! This module defines [`StreamHandler`], which formats log records and
//! writes them to a stream on a background thread. The handler forwards
//! records over a bounded channel so the producer never blocks on I/O. It is
//! the local console companion to the Discord handler.

use std::{
    any::Any,
    io::{self, Write},
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use log::warn;

use crate::{
    formatter::{DefaultFormatter, Formatter, SharedFormatter},
    handler::{Handler, HandlerError},
    log_record::LogRecord,
    rate_limited_warner::RateLimitedWarner,
};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

enum StreamCommand {
    Record(LogRecord),
    Flush(Sender<()>),
}

/// Handler that writes formatted log records to an `io::Write` stream.
///
/// Each instance owns a background thread which receives records via a
/// channel and writes them to the provided stream. The writer and formatter
/// are moved into that thread so the caller never locks or blocks.
pub struct StreamHandler {
    tx: Option<Sender<StreamCommand>>,
    handle: Option<JoinHandle<()>>,
    done_rx: Receiver<()>,
    drop_warner: RateLimitedWarner,
}

impl StreamHandler {
    /// Create a new handler writing to `stdout` with a `DefaultFormatter`.
    pub fn stdout() -> Self {
        Self::new(io::stdout(), DefaultFormatter)
    }

    /// Create a new handler writing to `stderr` with a `DefaultFormatter`.
    pub fn stderr() -> Self {
        Self::new(io::stderr(), DefaultFormatter)
    }

    /// Create a new handler from an arbitrary writer and formatter using the default capacity.
    pub fn new<W, F>(writer: W, formatter: F) -> Self
    where
        W: Write + Send + 'static,
        F: Formatter + 'static,
    {
        Self::with_capacity(writer, formatter, DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new handler with a custom channel capacity.
    pub fn with_capacity<W, F>(writer: W, formatter: F, capacity: usize) -> Self
    where
        W: Write + Send + 'static,
        F: Formatter + 'static,
    {
        let (tx, rx) = bounded(capacity.max(1));
        let (done_tx, done_rx) = bounded(1);
        let formatter = SharedFormatter::new(formatter);
        let handle = thread::spawn(move || {
            Self::worker_loop(writer, &formatter, &rx);
            let _ = done_tx.send(());
        });

        Self {
            tx: Some(tx),
            handle: Some(handle),
            done_rx,
            drop_warner: RateLimitedWarner::new(),
        }
    }

    // Write failures must not go through `log`: behind the global bridge the
    // warning would be queued back into this worker.
    fn worker_loop<W: Write>(mut writer: W, formatter: &SharedFormatter, rx: &Receiver<StreamCommand>) {
        let write_errors = RateLimitedWarner::new();
        for command in rx {
            match command {
                StreamCommand::Record(record) => {
                    let msg = formatter.format(&record);
                    if let Err(err) = writeln!(writer, "{msg}").and_then(|_| writer.flush()) {
                        write_errors.record_drop();
                        write_errors.warn_if_due(|count| report_write_errors(count, &err));
                    }
                }
                StreamCommand::Flush(ack) => {
                    let _ = writer.flush();
                    let _ = ack.send(());
                }
            }
        }
        write_errors.flush(|count| {
            let _ = writeln!(io::stderr(), "StreamHandler: {count} writes failed before shutdown");
        });
    }

    fn note_drop(&self) {
        self.drop_warner.record_drop();
        self.drop_warner.warn_if_due(|count| {
            warn!("StreamHandler: dropped {count} records; queue full or shutting down");
        });
    }
}

fn report_write_errors(count: u64, err: &io::Error) {
    let _ = writeln!(io::stderr(), "StreamHandler: {count} writes failed: {err}");
}

impl Handler for StreamHandler {
    fn handle(&self, record: LogRecord) -> Result<(), HandlerError> {
        let Some(tx) = &self.tx else {
            return Err(HandlerError::Closed);
        };
        match tx.try_send(StreamCommand::Record(record)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.note_drop();
                Err(HandlerError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => {
                self.note_drop();
                Err(HandlerError::Closed)
            }
        }
    }

    /// Block until every record queued before this call has been written.
    fn flush(&self) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        let (ack_tx, ack_rx) = bounded(1);
        if tx.send_timeout(StreamCommand::Flush(ack_tx), FLUSH_TIMEOUT).is_err() {
            return false;
        }
        ack_rx.recv_timeout(FLUSH_TIMEOUT).is_ok()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for StreamHandler {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit.
        self.tx.take();
        self.drop_warner.flush(|count| {
            warn!("StreamHandler: dropped {count} records before shutdown");
        });
        let Some(handle) = self.handle.take() else {
            return;
        };
        if self.done_rx.recv_timeout(SHUTDOWN_TIMEOUT).is_err() {
            warn!("StreamHandler: worker thread did not shut down within 1s");
            // Detach the thread so shutdown continues
            return;
        }
        if handle.join().is_err() {
            warn!("StreamHandler: worker thread panicked");
        }
    }
}

impl std::fmt::Debug for StreamHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandler")
            .field("closed", &self.tx.is_none())
            .field("pending_drops", &self.drop_warner.pending())
            .finish_non_exhaustive()
    }
}
