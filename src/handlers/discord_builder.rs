//! Builder for [`DiscordHandler`](crate::discord_handler::DiscordHandler).
//!
//! Collects the webhook target, presentation maps and shaping limits, then
//! validates them before the handler is constructed. Invalid settings fail
//! here rather than on the first log call.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::discord_handler::{
    DEFAULT_MAX_CONTENT_LEN, DiagnosticWriter, DiscordHandler, DiscordHandlerConfig, ErrorHook,
    LevelMap, UreqTransport, WebhookTransport,
};
use crate::formatter::{Formatter, SharedFormatter};
use crate::handler::HandlerError;
use crate::level::Level;
use crate::log_record::LogRecord;

use super::builder_macros::option_setter;
use super::{HandlerBuildError, HandlerBuilderTrait, ensure_positive};

/// Upper bound for the wrap threshold. Titles hold at most one line of this
/// length plus the emoji, and Discord caps embed titles at 256 chars.
pub const MAX_LINE_WRAP_THRESHOLD: usize = 240;
/// Discord rejects usernames longer than this.
const MAX_SERVICE_NAME_LEN: usize = 80;

/// Builder for constructing [`DiscordHandler`] instances.
#[derive(Clone, Default)]
pub struct DiscordHandlerBuilder {
    service_name: Option<String>,
    webhook_url: Option<String>,
    colours: Option<LevelMap<u32>>,
    emojis: Option<LevelMap<String>>,
    avatar_url: Option<String>,
    rate_limit_retry: Option<bool>,
    embed_line_wrap_threshold: Option<usize>,
    message_break_char: Option<String>,
    max_content_len: Option<usize>,
    timeout_ms: Option<u64>,
    level: Option<Level>,
    formatter: Option<SharedFormatter>,
    transport: Option<Arc<dyn WebhookTransport>>,
    diagnostics: Option<DiagnosticWriter>,
    error_hook: Option<ErrorHook>,
}

impl DiscordHandlerBuilder {
    /// Create a builder for a service posting to `webhook_url`.
    pub fn new(service_name: impl Into<String>, webhook_url: impl Into<String>) -> Self {
        Self {
            service_name: Some(service_name.into()),
            webhook_url: Some(webhook_url.into()),
            ..Self::default()
        }
    }

    /// Set the bot username shown in Discord (required).
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Set the channel webhook URL (required).
    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// Set the bot profile picture.
    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    /// Split records into separate messages on every `token`.
    pub fn with_message_break_char(mut self, token: impl Into<String>) -> Self {
        self.message_break_char = Some(token.into());
        self
    }

    option_setter!(
        #[doc = "Replace the per-level embed colours."]
        with_colours,
        colours,
        LevelMap<u32>
    );
    option_setter!(
        #[doc = "Replace the per-level emoji prefixes."]
        with_emojis,
        emojis,
        LevelMap<String>
    );
    option_setter!(
        #[doc = "Enable or disable waiting out Discord rate limits. Defaults to true."]
        with_rate_limit_retry,
        rate_limit_retry,
        bool
    );
    option_setter!(
        #[doc = "Set the line length above which messages become code blocks."]
        with_embed_line_wrap_threshold,
        embed_line_wrap_threshold,
        usize
    );
    option_setter!(
        #[doc = "Set the clip length applied to message bodies."]
        with_max_content_len,
        max_content_len,
        usize
    );
    option_setter!(
        #[doc = "Set the per-request timeout in milliseconds."]
        with_timeout_ms,
        timeout_ms,
        u64
    );
    option_setter!(
        #[doc = "Ignore records below this level."]
        with_level,
        level,
        Level
    );

    /// Render records with `formatter` instead of the bare message.
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Formatter + 'static,
    {
        self.formatter = Some(SharedFormatter::new(formatter));
        self
    }

    /// Send through `transport` instead of the default `ureq` client.
    pub fn with_transport(mut self, transport: Arc<dyn WebhookTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Write delivery diagnostics to `writer` instead of stderr.
    pub fn with_diagnostics<W>(mut self, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let diagnostics: DiagnosticWriter = Arc::new(Mutex::new(writer));
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Receive records that could not be delivered.
    pub fn with_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&LogRecord, &HandlerError) + Send + Sync + 'static,
    {
        self.error_hook = Some(Arc::new(hook));
        self
    }

    fn validate(&self) -> Result<(), HandlerBuildError> {
        self.validate_service_name()?;
        self.validate_url()?;
        self.validate_shaping()?;
        if let Some(timeout) = self.timeout_ms {
            ensure_positive!(timeout, "timeout_ms")?;
        }
        Ok(())
    }

    fn validate_service_name(&self) -> Result<(), HandlerBuildError> {
        match &self.service_name {
            None => Err(HandlerBuildError::InvalidConfig(
                "Discord handler requires a service name".into(),
            )),
            Some(name) if name.trim().is_empty() => Err(HandlerBuildError::InvalidConfig(
                "service name must not be empty".into(),
            )),
            Some(name) if name.chars().count() > MAX_SERVICE_NAME_LEN => {
                Err(HandlerBuildError::InvalidConfig(format!(
                    "service name must be at most {MAX_SERVICE_NAME_LEN} characters"
                )))
            }
            _ => Ok(()),
        }
    }

    fn validate_url(&self) -> Result<(), HandlerBuildError> {
        match &self.webhook_url {
            None => Err(HandlerBuildError::InvalidConfig(
                "Discord handler requires a webhook URL".into(),
            )),
            Some(url) if url.trim().is_empty() => Err(HandlerBuildError::InvalidConfig(
                "webhook URL must not be empty".into(),
            )),
            _ => Ok(()),
        }
    }

    fn validate_shaping(&self) -> Result<(), HandlerBuildError> {
        if let Some(threshold) = self.embed_line_wrap_threshold {
            ensure_positive!(threshold, "embed_line_wrap_threshold")?;
            if threshold > MAX_LINE_WRAP_THRESHOLD {
                return Err(HandlerBuildError::InvalidConfig(format!(
                    "embed_line_wrap_threshold must be at most {MAX_LINE_WRAP_THRESHOLD}"
                )));
            }
        }
        if let Some(max_len) = self.max_content_len
            && !(6..=DEFAULT_MAX_CONTENT_LEN).contains(&max_len)
        {
            return Err(HandlerBuildError::InvalidConfig(format!(
                "max_content_len must be between 6 and {DEFAULT_MAX_CONTENT_LEN}"
            )));
        }
        if self.message_break_char.as_deref() == Some("") {
            return Err(HandlerBuildError::InvalidConfig(
                "message_break_char must not be empty".into(),
            ));
        }
        Ok(())
    }

    fn build_config(&self) -> Result<DiscordHandlerConfig, HandlerBuildError> {
        self.validate()?;

        let defaults = DiscordHandlerConfig::default();
        Ok(DiscordHandlerConfig {
            service_name: self.service_name.clone().unwrap_or_default(),
            webhook_url: self.webhook_url.clone().unwrap_or_default(),
            colours: self.colours.clone().unwrap_or(defaults.colours),
            emojis: self.emojis.clone().unwrap_or(defaults.emojis),
            avatar_url: self.avatar_url.clone(),
            rate_limit_retry: self.rate_limit_retry.unwrap_or(defaults.rate_limit_retry),
            embed_line_wrap_threshold: self
                .embed_line_wrap_threshold
                .unwrap_or(defaults.embed_line_wrap_threshold),
            message_break_char: self.message_break_char.clone(),
            max_content_len: self.max_content_len.unwrap_or(defaults.max_content_len),
            timeout: self
                .timeout_ms
                .map_or(defaults.timeout, Duration::from_millis),
            level: self.level.unwrap_or(defaults.level),
        })
    }

    /// Build and return the handler.
    pub fn build(&self) -> Result<DiscordHandler, HandlerBuildError> {
        self.build_inner()
    }
}

impl HandlerBuilderTrait for DiscordHandlerBuilder {
    type Handler = DiscordHandler;

    fn build_inner(&self) -> Result<Self::Handler, HandlerBuildError> {
        let config = self.build_config()?;
        let transport: Arc<dyn WebhookTransport> = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(UreqTransport::new(config.timeout)?),
        };
        let mut handler = DiscordHandler::with_transport(config, transport);
        if let Some(formatter) = &self.formatter {
            handler.set_formatter(formatter.clone());
        }
        if let Some(diagnostics) = &self.diagnostics {
            handler = handler.with_diagnostics(Arc::clone(diagnostics));
        }
        if let Some(hook) = &self.error_hook {
            handler = handler.with_error_hook(Arc::clone(hook));
        }
        Ok(handler)
    }
}

impl std::fmt::Debug for DiscordHandlerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The webhook URL embeds a token, so only its presence is shown.
        f.debug_struct("DiscordHandlerBuilder")
            .field("service_name", &self.service_name)
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "<redacted>"))
            .field("avatar_url", &self.avatar_url)
            .field("rate_limit_retry", &self.rate_limit_retry)
            .field("embed_line_wrap_threshold", &self.embed_line_wrap_threshold)
            .field("message_break_char", &self.message_break_char)
            .field("max_content_len", &self.max_content_len)
            .field("timeout_ms", &self.timeout_ms)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}
