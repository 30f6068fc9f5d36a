//! Configuration consumed by [`DiscordHandler`](super::DiscordHandler).
//!
//! `DiscordHandlerBuilder` validates and constructs these values before
//! handing them to the handler for runtime use.

use std::time::Duration;

use super::shaping::DEFAULT_MAX_CONTENT_LEN;
use super::style::{LevelMap, default_colours, default_emojis};
use crate::level::Level;

/// Characters a single line may hold before the message is shown as code.
pub const DEFAULT_LINE_WRAP_THRESHOLD: usize = 60;
/// Default timeout applied to each webhook request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable handler configuration.
#[derive(Clone, Debug)]
pub struct DiscordHandlerConfig {
    /// Shown as the bot username in Discord.
    pub service_name: String,
    /// Channel webhook URL. Treat as a secret.
    pub webhook_url: String,
    /// Embed colour per level.
    pub colours: LevelMap<u32>,
    /// Title prefix per level.
    pub emojis: LevelMap<String>,
    /// Bot profile picture.
    pub avatar_url: Option<String>,
    /// Let the transport wait and retry when Discord rate limits us.
    pub rate_limit_retry: bool,
    /// Line length above which output switches to a code block.
    pub embed_line_wrap_threshold: usize,
    /// Token that splits one record into several Discord messages.
    pub message_break_char: Option<String>,
    /// Clip length for message bodies.
    pub max_content_len: usize,
    /// Per-request timeout used by the default transport.
    pub timeout: Duration,
    /// Records below this level are ignored.
    pub level: Level,
}

impl Default for DiscordHandlerConfig {
    fn default() -> Self {
        Self {
            service_name: String::new(),
            webhook_url: String::new(),
            colours: default_colours(),
            emojis: default_emojis(),
            avatar_url: None,
            rate_limit_retry: true,
            embed_line_wrap_threshold: DEFAULT_LINE_WRAP_THRESHOLD,
            message_break_char: None,
            max_content_len: DEFAULT_MAX_CONTENT_LEN,
            timeout: DEFAULT_TIMEOUT,
            level: Level::Trace,
        }
    }
}
