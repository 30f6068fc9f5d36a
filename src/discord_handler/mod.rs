//! Discord webhook handler implementation.
//!
//! This module defines [`DiscordHandler`], a handler that shapes
//! [`LogRecord`](crate::log_record::LogRecord) values into Discord messages
//! and posts them through a [`WebhookTransport`].
//!
//! # Message shapes
//!
//! - **Title embed**: short single-line messages become the embed title,
//!   coloured by level and prefixed with the level's emoji.
//! - **Described embed**: multi-line messages whose lines all fit the wrap
//!   threshold put the first line in the title and the rest in the
//!   description.
//! - **Code block**: anything with a line longer than the threshold is sent
//!   as fenced content so tables and tracebacks keep their layout.
//!
//! Bodies are clipped to [`DEFAULT_MAX_CONTENT_LEN`] chars, keeping the tail.
//! A configured break token splits a record into several messages to get
//! past Discord's 2000-character ceiling.
//!
//! # Recursion
//!
//! The transport logs through the `log` crate. When this handler sits behind
//! the `log` facade those records re-enter the handler. The
//! [`ReentryGuard`] discards them for the duration of the send.

mod config;
mod guard;
mod handler;
mod payload;
mod shaping;
mod style;
mod transport;


pub use config::{DEFAULT_LINE_WRAP_THRESHOLD, DEFAULT_TIMEOUT, DiscordHandlerConfig};
pub use guard::{Emitting, ReentryGuard};
pub use handler::{DiagnosticWriter, DiscordHandler, ErrorHook};
pub use payload::{Embed, OutboundUnit, ShapeLimits, WebhookMessage};
pub use shaping::{
    DEFAULT_MAX_CONTENT_LEN, DISCORD_CONTENT_LIMIT, clip_content, max_line_length,
    should_format_as_code_block, split_by_break_character, split_first_line,
};
pub use style::{FALLBACK_KEY, LevelMap, RecordStyle, default_colours, default_emojis};
pub use transport::{
    DEFAULT_MAX_RATE_LIMIT_RETRIES, TransportError, UreqTransport, WebhookRequest,
    WebhookTransport,
};
