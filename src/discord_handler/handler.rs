//! Public handler type exported by the crate.

use std::any::Any;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::{
    formatter::{MessageFormatter, SharedFormatter},
    handler::{Handler, HandlerError, report_handler_error},
    handlers::HandlerBuildError,
    log_record::{DISCORD_THREAD_ID_KEY, DISCORD_THREAD_NAME_KEY, LogRecord},
};

use super::{
    config::DiscordHandlerConfig,
    guard::ReentryGuard,
    payload::{OutboundUnit, ShapeLimits, WebhookMessage},
    shaping::{clip_content, split_by_break_character},
    style::RecordStyle,
    transport::{TransportError, UreqTransport, WebhookRequest, WebhookTransport},
};

/// Callback receiving records the handler failed to deliver.
///
/// The hook runs while the handler is still marked as emitting, so anything
/// it logs back through the same handler is discarded.
pub type ErrorHook = Arc<dyn Fn(&LogRecord, &HandlerError) + Send + Sync>;

/// Local stream for delivery diagnostics. Never routed through a logger.
pub type DiagnosticWriter = Arc<Mutex<dyn Write + Send>>;

/// Handler posting records to a Discord channel webhook.
///
/// Each record is formatted, split on the optional break token and shaped
/// into one embed or code block per segment. Segments are posted one by one
/// on the calling thread. Delivery failures never reach the caller. They are
/// written to the diagnostic stream and passed to the error hook.
pub struct DiscordHandler {
    config: DiscordHandlerConfig,
    transport: Arc<dyn WebhookTransport>,
    formatter: RwLock<SharedFormatter>,
    guard: ReentryGuard,
    diagnostics: DiagnosticWriter,
    error_hook: Option<ErrorHook>,
}

impl DiscordHandler {
    /// Construct the handler with the default `ureq` transport.
    pub fn with_config(config: DiscordHandlerConfig) -> Result<Self, HandlerBuildError> {
        let transport = UreqTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Construct the handler around a caller-supplied transport.
    pub fn with_transport(config: DiscordHandlerConfig, transport: Arc<dyn WebhookTransport>) -> Self {
        Self {
            config,
            transport,
            formatter: RwLock::new(SharedFormatter::new(MessageFormatter)),
            guard: ReentryGuard::new(),
            diagnostics: Arc::new(Mutex::new(io::stderr())),
            error_hook: None,
        }
    }

    pub(crate) fn with_diagnostics(mut self, diagnostics: DiagnosticWriter) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub(crate) fn with_error_hook(mut self, hook: ErrorHook) -> Self {
        self.error_hook = Some(hook);
        self
    }

    pub fn config(&self) -> &DiscordHandlerConfig {
        &self.config
    }

    /// Replace the formatter used to render records before shaping.
    pub fn set_formatter(&self, formatter: SharedFormatter) {
        *self.formatter.write() = formatter;
    }

    /// Whether a send is currently in progress.
    pub fn is_emitting(&self) -> bool {
        self.guard.is_emitting()
    }

    /// Send `record` to Discord.
    ///
    /// Returns immediately when called re-entrantly from the handler's own
    /// send path, or when the record is below the configured level.
    pub fn emit(&self, record: &LogRecord) {
        if record.level < self.config.level {
            return;
        }
        let Some(_emitting) = self.guard.enter() else {
            return;
        };

        let message = self.formatter.read().format(record);
        let style = RecordStyle::resolve(record.level, &self.config.colours, &self.config.emojis);
        let limits = ShapeLimits {
            wrap_threshold: self.config.embed_line_wrap_threshold,
            max_content_len: self.config.max_content_len,
        };
        let break_char = self.config.message_break_char.as_deref();

        for segment in split_by_break_character(&message, break_char) {
            if segment.is_empty() {
                continue;
            }
            let unit = OutboundUnit::build(segment, &style, limits);
            let request = self.request(self.routed_message(record).with_unit(unit));
            if let Err(err) = self.transport.execute(&request) {
                self.on_delivery_failure(record, &request, err);
            }
        }
    }

    fn base_message(&self) -> WebhookMessage {
        WebhookMessage::new(&self.config.service_name, self.config.avatar_url.clone())
    }

    fn routed_message(&self, record: &LogRecord) -> WebhookMessage {
        self.base_message().in_thread(
            record.key_value(DISCORD_THREAD_ID_KEY).map(str::to_owned),
            record.key_value(DISCORD_THREAD_NAME_KEY).map(str::to_owned),
        )
    }

    fn request(&self, message: WebhookMessage) -> WebhookRequest {
        WebhookRequest {
            url: self.config.webhook_url.clone(),
            rate_limit_retry: self.config.rate_limit_retry,
            message,
        }
    }

    fn on_delivery_failure(&self, record: &LogRecord, request: &WebhookRequest, err: TransportError) {
        if let TransportError::Status { status, body } = &err {
            self.write_diagnostic(format_args!(
                "Discord webhook request failed: {status}: {body}. Payload content was: {:?}, embeds: {:?}",
                request.message.content, request.message.embeds
            ));
            self.send_failure_notice(*status, body);
        }
        let err = HandlerError::from(err);
        self.write_diagnostic(format_args!("Error from Discord logger {err}"));
        self.handle_error(record, &err);
    }

    /// Tell the channel a record went missing. Best effort: a failing notice
    /// is only written to the diagnostic stream.
    fn send_failure_notice(&self, status: u16, body: &str) {
        let notice = format!("Failed to deliver log message: {status}: {body}");
        let notice = clip_content(&notice, self.config.max_content_len, false);
        let request = self.request(self.base_message().with_content(notice));
        if let Err(err) = self.transport.execute(&request) {
            self.write_diagnostic(format_args!("Failed to report delivery failure: {err}"));
        }
    }

    fn write_diagnostic(&self, message: std::fmt::Arguments<'_>) {
        let mut out = self.diagnostics.lock();
        let _ = writeln!(out, "{message}");
    }
}

impl Handler for DiscordHandler {
    fn handle(&self, record: LogRecord) -> Result<(), HandlerError> {
        self.emit(&record);
        Ok(())
    }

    fn handle_error(&self, record: &LogRecord, err: &HandlerError) {
        match &self.error_hook {
            Some(hook) => hook(record, err),
            None => report_handler_error(&mut *self.diagnostics.lock(), record, err),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for DiscordHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordHandler")
            .field("service_name", &self.config.service_name)
            .field("level", &self.config.level)
            .field("emitting", &self.is_emitting())
            .finish_non_exhaustive()
    }
}
