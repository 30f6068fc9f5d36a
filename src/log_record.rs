//! Log record representation passed from loggers to handlers.
//!
//! [`LogRecord`] captures one logging call together with its source location,
//! timestamp, thread information and free-form key-value pairs. The Discord
//! handler reads two well-known keys from the key-values to route messages
//! into channel threads.

use crate::level::Level;
use std::collections::BTreeMap;
use std::fmt;
use std::thread::{self, ThreadId};
use std::time::SystemTime;

/// Key naming the Discord thread a record should be posted into.
pub const DISCORD_THREAD_ID_KEY: &str = "discord_thread_id";
/// Key naming a new forum thread to create for a record.
pub const DISCORD_THREAD_NAME_KEY: &str = "discord_thread_name";

/// Additional context associated with a log record.
#[derive(Clone, Debug)]
pub struct RecordMetadata {
    /// Rust module path where the log call originated.
    pub module_path: String,
    /// Source file name for the log call.
    pub filename: String,
    /// Line number in the source file.
    pub line_number: u32,
    /// Time the record was created.
    pub timestamp: SystemTime,
    /// ID of the thread that created the record.
    pub thread_id: ThreadId,
    /// Name of the thread that created the record (if any).
    pub thread_name: Option<String>,
    /// Structured key-value pairs attached to the record.
    pub key_values: BTreeMap<String, String>,
}

impl RecordMetadata {
    /// Capture timestamp and thread info from the current execution context.
    fn capture_runtime() -> (SystemTime, ThreadId, Option<String>) {
        let current = thread::current();
        (
            SystemTime::now(),
            current.id(),
            current.name().map(ToString::to_string),
        )
    }
}

impl Default for RecordMetadata {
    fn default() -> Self {
        let (timestamp, thread_id, thread_name) = Self::capture_runtime();
        Self {
            module_path: String::new(),
            filename: String::new(),
            line_number: 0,
            timestamp,
            thread_id,
            thread_name,
            key_values: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LogRecord {
    /// Name of the logger that created this record.
    pub logger: String,
    /// Severity of the record.
    pub level: Level,
    /// The log message content.
    pub message: String,
    /// Contextual metadata for the record.
    pub metadata: RecordMetadata,
}

impl LogRecord {
    /// Construct a new log record from logger `name`, `level`, and `message`.
    pub fn new(logger: &str, level: Level, message: &str) -> Self {
        Self {
            logger: logger.to_owned(),
            level,
            message: message.to_owned(),
            metadata: RecordMetadata::default(),
        }
    }

    /// Construct a log record with explicit source location and key-values.
    ///
    /// Timestamp and thread fields are always refreshed from the calling
    /// thread.
    pub fn with_metadata(
        logger: &str,
        level: Level,
        message: &str,
        mut metadata: RecordMetadata,
    ) -> Self {
        let (timestamp, thread_id, thread_name) = RecordMetadata::capture_runtime();
        metadata.timestamp = timestamp;
        metadata.thread_id = thread_id;
        metadata.thread_name = thread_name;
        Self {
            logger: logger.to_owned(),
            level,
            message: message.to_owned(),
            metadata,
        }
    }

    /// Attach a key-value pair, replacing any previous value for `key`.
    pub fn with_key_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.key_values.insert(key.into(), value.into());
        self
    }

    /// Route this record into an existing Discord thread.
    pub fn in_discord_thread(self, thread_id: impl Into<String>) -> Self {
        self.with_key_value(DISCORD_THREAD_ID_KEY, thread_id)
    }

    pub fn key_value(&self, key: &str) -> Option<&str> {
        self.metadata.key_values.get(key).map(String::as_str)
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message)
    }
}
