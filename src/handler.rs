//! Handler trait and the error type handlers report.

use std::any::Any;
use std::io::{self, Write};

use thiserror::Error;

use crate::discord_handler::TransportError;
use crate::log_record::LogRecord;

/// Errors produced while a handler processes a record.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler's queue is at capacity; the record was dropped.
    #[error("handler queue is full")]
    QueueFull,
    /// The handler has shut down; the record was dropped.
    #[error("handler is closed")]
    Closed,
    /// The webhook transport failed to deliver the record.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Trait implemented by all log handlers.
///
/// Handlers are shared between loggers and threads, so implementations must
/// be `Send + Sync`.
pub trait Handler: Send + Sync {
    /// Dispatch a log record for handling.
    fn handle(&self, record: LogRecord) -> Result<(), HandlerError>;

    /// Flush any buffered records. Returns `false` if flushing timed out or
    /// the handler is closed.
    fn flush(&self) -> bool {
        true
    }

    /// Error hook invoked when handling a record fails.
    ///
    /// Implementations must not log through the handler that failed.
    fn handle_error(&self, record: &LogRecord, err: &HandlerError) {
        report_handler_error(&mut io::stderr(), record, err);
    }

    fn as_any(&self) -> &dyn Any;
}

/// Write a handler failure to `out` without going through any logger.
pub fn report_handler_error(out: &mut dyn Write, record: &LogRecord, err: &HandlerError) {
    // Nothing sensible is left to do if the diagnostic stream fails too.
    let _ = writeln!(
        out,
        "--- Logging error ---\n{err}\nLogger: {}, level: {}\nMessage: {:?}",
        record.logger, record.level, record.message
    );
}
