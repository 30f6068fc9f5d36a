//! Bridge from the `tracing` ecosystem into a [`Logger`].
//!
//! [`LoggerLayer`] is a `tracing_subscriber` layer that turns every event
//! into a [`LogRecord`]. The `message` field becomes the record message and
//! the other fields become key-values, so
//! `tracing::warn!(discord_thread_id = "123", "disk low")` posts into thread
//! `123` when a Discord handler is attached.

use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::level::Level;
use crate::log_compat::normalise_target;
use crate::log_record::{LogRecord, RecordMetadata};
use crate::logger::Logger;

/// Layer forwarding tracing events to a [`Logger`].
pub struct LoggerLayer {
    logger: Arc<Logger>,
}

impl LoggerLayer {
    #[must_use]
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }

    fn map_level(level: &tracing::Level) -> Level {
        match *level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::TRACE => Level::Trace,
        }
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = Self::map_level(metadata.level());
        if !self.logger.is_enabled_for(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let record_metadata = RecordMetadata {
            module_path: metadata.module_path().unwrap_or_default().to_string(),
            filename: metadata.file().unwrap_or_default().to_string(),
            line_number: metadata.line().unwrap_or(0),
            key_values: visitor.fields,
            ..Default::default()
        };
        let target = normalise_target(metadata.target());
        let record = LogRecord::with_metadata(
            target.as_ref(),
            level,
            &visitor.message.unwrap_or_default(),
            record_metadata,
        );
        self.logger.dispatch_record(record);
    }
}

/// Collects the message and the remaining fields of an event.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: std::collections::BTreeMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.fields
                .insert(field.name().to_owned(), format!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        } else {
            self.fields.insert(field.name().to_owned(), value.to_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_record::DISCORD_THREAD_ID_KEY;
    use crate::testing::CollectingHandler;
    use tracing_subscriber::layer::SubscriberExt;

    fn capture(level: Level, body: impl FnOnce()) -> CollectingHandler {
        let logger = Arc::new(Logger::new("root"));
        logger.set_level(level);
        let handler = CollectingHandler::default();
        logger.add_handler(Arc::new(handler.clone()));
        let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(logger));
        tracing::subscriber::with_default(subscriber, body);
        handler
    }

    #[test]
    fn events_become_records() {
        let handler = capture(Level::Trace, || {
            tracing::info!(target: "app::db", "connected to {}", "primary");
        });
        let records = handler.collected();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].logger, "app.db");
        assert_eq!(records[0].level, Level::Info);
        assert_eq!(records[0].message, "connected to primary");
    }

    #[test]
    fn fields_become_key_values() {
        let handler = capture(Level::Trace, || {
            tracing::warn!(discord_thread_id = "123", attempt = 2, "disk low");
        });
        let record = &handler.collected()[0];
        assert_eq!(record.key_value(DISCORD_THREAD_ID_KEY), Some("123"));
        assert_eq!(record.key_value("attempt"), Some("2"));
        assert_eq!(record.message, "disk low");
    }

    #[test]
    fn logger_threshold_applies() {
        let handler = capture(Level::Warn, || {
            tracing::debug!("quiet");
            tracing::error!("loud");
        });
        assert_eq!(handler.messages(), ["loud"]);
    }
}
