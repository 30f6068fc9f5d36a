//! Named logger dispatching records to its handlers.
//!
//! Dispatch happens on the calling thread. Handlers that do their own I/O on
//! a worker (such as [`StreamHandler`](crate::stream_handler::StreamHandler))
//! return quickly; the Discord handler blocks for the duration of the post.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::RwLock;

use crate::handler::Handler;
use crate::level::Level;
use crate::log_record::LogRecord;

/// Logger with a level threshold and a list of handlers.
pub struct Logger {
    name: String,
    level: AtomicU8,
    handlers: RwLock<Vec<Arc<dyn Handler>>>,
}

impl Logger {
    /// Create a logger named `name` with an `INFO` threshold and no handlers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: AtomicU8::new(Level::Info as u8),
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the minimum level this logger accepts.
    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    /// Return the logger's current minimum level.
    pub fn level(&self) -> Level {
        // Only `set_level` writes the atomic, so the value is always valid.
        Level::try_from(self.level.load(Ordering::Relaxed)).unwrap_or(Level::Critical)
    }

    pub fn is_enabled_for(&self, level: Level) -> bool {
        level as u8 >= self.level.load(Ordering::Relaxed)
    }

    /// Attach a handler to this logger.
    pub fn add_handler(&self, handler: Arc<dyn Handler>) {
        self.handlers.write().push(handler);
    }

    /// Detach a handler previously added to this logger.
    pub fn remove_handler(&self, handler: &Arc<dyn Handler>) -> bool {
        let mut handlers = self.handlers.write();
        if let Some(pos) = handlers.iter().position(|h| Arc::ptr_eq(h, handler)) {
            handlers.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn clear_handlers(&self) {
        self.handlers.write().clear();
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Log `message` at `level` if the threshold allows it.
    pub fn log(&self, level: Level, message: &str) {
        if !self.is_enabled_for(level) {
            return;
        }
        self.dispatch_record(LogRecord::new(&self.name, level, message));
    }

    pub fn trace(&self, message: &str) {
        self.log(Level::Trace, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    pub fn critical(&self, message: &str) {
        self.log(Level::Critical, message);
    }

    /// Dispatch an already-constructed record through this logger.
    ///
    /// The handler list is cloned before dispatch and no lock is held while
    /// handlers run. A handler that logs back into this logger therefore
    /// cannot deadlock against it.
    pub fn dispatch_record(&self, record: LogRecord) {
        if !self.is_enabled_for(record.level) {
            return;
        }
        let handlers = self.handlers.read().clone();
        let Some((last, rest)) = handlers.split_last() else {
            return;
        };
        for handler in rest {
            Self::send(handler.as_ref(), record.clone());
        }
        Self::send(last.as_ref(), record);
    }

    fn send(handler: &dyn Handler, record: LogRecord) {
        // The error hook needs the record after `handle` has consumed it.
        let Err(err) = handler.handle(record.clone()) else {
            return;
        };
        handler.handle_error(&record, &err);
    }

    /// Flush every handler. Returns `false` if any handler failed to flush.
    pub fn flush_handlers(&self) -> bool {
        let handlers = self.handlers.read().clone();
        handlers.iter().fold(true, |ok, handler| handler.flush() && ok)
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("handlers", &self.handler_count())
            .finish()
    }
}
