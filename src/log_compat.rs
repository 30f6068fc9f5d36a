//! Compatibility bridge for the Rust `log` crate.
//!
//! This module provides [`LogAdapter`], an implementation of `log::Log` that
//! forwards `log` records into a [`Logger`] and from there to its handlers.
//! [`install_global_logger`] installs an adapter as the process-wide logger.
//!
//! Records produced while a Discord handler is sending (for example the
//! transport's rate-limit warnings) travel this bridge back into the same
//! handler, where the re-entry guard discards them.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use log::kv::{self, VisitSource};
use log::{Metadata, Record};

use crate::level::Level;
use crate::log_record::{LogRecord, RecordMetadata};
use crate::logger::Logger;

/// Adapter implementing the Rust `log::Log` trait.
///
/// Every record is converted to a [`LogRecord`] named after its target and
/// dispatched through the wrapped logger.
pub struct LogAdapter {
    logger: Arc<Logger>,
}

impl LogAdapter {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }
}

fn map_log_level(level: log::Level) -> Level {
    match level {
        log::Level::Trace => Level::Trace,
        log::Level::Debug => Level::Debug,
        log::Level::Info => Level::Info,
        log::Level::Warn => Level::Warn,
        log::Level::Error => Level::Error,
    }
}

/// Map a crate level onto the `log` crate. `CRITICAL` becomes `ERROR`
/// because the `log` crate has no critical level.
pub fn to_log_level(level: Level) -> log::Level {
    match level {
        Level::Trace => log::Level::Trace,
        Level::Debug => log::Level::Debug,
        Level::Info => log::Level::Info,
        Level::Warn => log::Level::Warn,
        Level::Error | Level::Critical => log::Level::Error,
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        map_log_level(level)
    }
}

/// Rewrite Rust module paths (`a::b`) into dotted logger names (`a.b`).
pub fn normalise_target(target: &str) -> Cow<'_, str> {
    if target.contains("::") {
        Cow::Owned(target.replace("::", "."))
    } else {
        Cow::Borrowed(target)
    }
}

/// Collects structured key-values (`log::info!(key = value; ...)`) as text.
struct KeyValueCollector<'a>(&'a mut BTreeMap<String, String>);

impl<'kvs> VisitSource<'kvs> for KeyValueCollector<'_> {
    fn visit_pair(&mut self, key: kv::Key<'kvs>, value: kv::Value<'kvs>) -> Result<(), kv::Error> {
        self.0.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn collect_key_values(record: &Record<'_>) -> BTreeMap<String, String> {
    let mut key_values = BTreeMap::new();
    // The collector never fails, so neither does the visit.
    let _ = kv::Source::visit(record.key_values(), &mut KeyValueCollector(&mut key_values));
    key_values
}

impl log::Log for LogAdapter {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.logger.is_enabled_for(Level::from(metadata.level()))
    }

    fn log(&self, record: &Record<'_>) {
        // The `log` macros have already applied the global max level.
        let level = Level::from(record.level());
        if !self.logger.is_enabled_for(level) {
            return;
        }

        let metadata = RecordMetadata {
            module_path: record.module_path().unwrap_or_default().to_string(),
            filename: record.file().unwrap_or_default().to_string(),
            line_number: record.line().unwrap_or(0),
            key_values: collect_key_values(record),
            ..Default::default()
        };
        let target = normalise_target(record.target());
        let log_record = LogRecord::with_metadata(
            target.as_ref(),
            level,
            &record.args().to_string(),
            metadata,
        );
        self.logger.dispatch_record(log_record);
    }

    fn flush(&self) {
        self.logger.flush_handlers();
    }
}

static GLOBAL_ADAPTER: OnceLock<LogAdapter> = OnceLock::new();
static INSTALL_RESULT: OnceLock<bool> = OnceLock::new();

/// Install `logger` behind the global `log` facade.
///
/// Returns `true` on success. When a different global logger is already set,
/// installation fails and `false` is returned. Subsequent calls return the
/// cached outcome and ignore their argument.
pub fn install_global_logger(logger: Arc<Logger>) -> bool {
    *INSTALL_RESULT.get_or_init(|| {
        let adapter = GLOBAL_ADAPTER.get_or_init(|| LogAdapter::new(logger));
        if log::set_logger(adapter).is_err() {
            return false;
        }
        log::set_max_level(log::LevelFilter::Trace);
        true
    })
}

/// Logger behind the global facade, if [`install_global_logger`] succeeded.
pub fn global_logger() -> Option<&'static Arc<Logger>> {
    match INSTALL_RESULT.get() {
        Some(true) => GLOBAL_ADAPTER.get().map(LogAdapter::logger),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the `log` crate bridge.

    use super::*;
    use crate::log_record::DISCORD_THREAD_ID_KEY;
    use crate::testing::CollectingHandler;
    use log::Log;
    use rstest::rstest;

    #[rstest]
    #[case(log::Level::Trace, Level::Trace)]
    #[case(log::Level::Debug, Level::Debug)]
    #[case(log::Level::Info, Level::Info)]
    #[case(log::Level::Warn, Level::Warn)]
    #[case(log::Level::Error, Level::Error)]
    fn level_mapping_is_direct(#[case] level: log::Level, #[case] expected: Level) {
        assert_eq!(Level::from(level), expected);
        assert_eq!(to_log_level(expected), level);
    }

    #[test]
    fn critical_maps_to_error() {
        assert_eq!(to_log_level(Level::Critical), log::Level::Error);
    }

    #[rstest]
    #[case("bridge::mod", "bridge.mod")]
    #[case("bridge.mod", "bridge.mod")]
    #[case("plain", "plain")]
    fn targets_are_normalised(#[case] target: &str, #[case] expected: &str) {
        assert_eq!(normalise_target(target), expected);
    }

    fn adapter_with_handler() -> (LogAdapter, CollectingHandler) {
        let logger = Arc::new(Logger::new("root"));
        logger.set_level(Level::Trace);
        let handler = CollectingHandler::default();
        logger.add_handler(Arc::new(handler.clone()));
        (LogAdapter::new(logger), handler)
    }

    #[test]
    fn adapter_dispatches_records_with_metadata() {
        let (adapter, handler) = adapter_with_handler();
        let record = log::Record::builder()
            .args(format_args!("hello"))
            .level(log::Level::Info)
            .target("bridge::test")
            .module_path(Some("bridge::test"))
            .file(Some("lib.rs"))
            .line(Some(42))
            .build();

        adapter.log(&record);

        let records = handler.collected();
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.logger, "bridge.test");
        assert_eq!(rec.level, Level::Info);
        assert_eq!(rec.message, "hello");
        assert_eq!(rec.metadata.module_path, "bridge::test");
        assert_eq!(rec.metadata.filename, "lib.rs");
        assert_eq!(rec.metadata.line_number, 42);
    }

    #[test]
    fn adapter_keeps_key_values() {
        let (adapter, handler) = adapter_with_handler();
        let pairs = [(DISCORD_THREAD_ID_KEY, "555"), ("attempt", "3")];
        let record = log::Record::builder()
            .args(format_args!("disk low"))
            .level(log::Level::Warn)
            .target("bridge")
            .key_values(&pairs)
            .build();

        adapter.log(&record);

        let records = handler.collected();
        assert_eq!(records[0].key_value(DISCORD_THREAD_ID_KEY), Some("555"));
        assert_eq!(records[0].key_value("attempt"), Some("3"));
    }

    #[test]
    fn log_respects_logger_threshold() {
        let (adapter, handler) = adapter_with_handler();
        adapter.logger().set_level(Level::Warn);

        for (level, text) in [(log::Level::Info, "info"), (log::Level::Warn, "warn")] {
            adapter.log(
                &log::Record::builder()
                    .args(format_args!("{text}"))
                    .level(level)
                    .target("bridge.level")
                    .build(),
            );
        }

        assert_eq!(handler.messages(), ["warn"]);
        let metadata = log::Metadata::builder().level(log::Level::Debug).build();
        assert!(!adapter.enabled(&metadata));
    }
}
