//! Formatter implementations shared by handlers.
//!
//! Provides the core [`Formatter`] trait alongside a reference-counted
//! [`SharedFormatter`] wrapper so a single formatter instance can be reused by
//! several handlers and swapped at runtime.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Local};

use crate::log_record::LogRecord;

/// Trait for formatting log records into strings.
///
/// Implementors must be thread-safe (`Send + Sync`) so formatters can be
/// shared across threads in a logging system.
pub trait Formatter: Send + Sync {
    /// Format a log record into a string representation.
    fn format(&self, record: &LogRecord) -> String;
}

/// Shared formatter trait object used across handlers.
#[derive(Clone)]
pub struct SharedFormatter {
    inner: Arc<dyn Formatter + Send + Sync>,
}

impl SharedFormatter {
    /// Create a shared formatter from an owned formatter implementation.
    pub fn new<F>(formatter: F) -> Self
    where
        F: Formatter + Send + Sync + 'static,
    {
        let inner: Arc<dyn Formatter + Send + Sync> = Arc::new(formatter);
        Self { inner }
    }

    /// Format a log record using the wrapped formatter instance.
    pub fn format(&self, record: &LogRecord) -> String {
        self.inner.format(record)
    }
}

impl fmt::Debug for SharedFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedFormatter(<dyn Formatter>)")
    }
}

/// Console-style formatter: `time - logger - LEVEL - message`.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultFormatter;

impl Formatter for DefaultFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let time: DateTime<Local> = record.metadata.timestamp.into();
        format!(
            "{} - {} - {} - {}",
            time.format("%Y-%m-%d %H:%M:%S,%3f"),
            record.logger,
            record.level,
            record.message
        )
    }
}

/// Emits the bare message. Used by the Discord handler, where level and
/// origin are conveyed through colour and emoji instead.
#[derive(Copy, Clone, Debug, Default)]
pub struct MessageFormatter;

impl Formatter for MessageFormatter {
    fn format(&self, record: &LogRecord) -> String {
        record.message.clone()
    }
}

impl Formatter for Arc<dyn Formatter + Send + Sync> {
    fn format(&self, record: &LogRecord) -> String {
        (**self).format(record)
    }
}

impl Formatter for SharedFormatter {
    fn format(&self, record: &LogRecord) -> String {
        self.inner.format(record)
    }
}
