//! Log handler that forwards records to a Discord channel webhook.
//!
//! The crate is built around [`DiscordHandler`]: records are formatted,
//! split on an optional break token and shaped into embeds or code blocks
//! before being posted. A small logging core ([`Logger`], [`StreamHandler`])
//! and bridges for the `log` and `tracing` crates let applications route
//! their existing logging into Discord.
//!
//! ```no_run
//! use std::sync::Arc;
//! use discord_logging::{DiscordHandlerBuilder, Level, Logger};
//!
//! let handler = DiscordHandlerBuilder::new("Backup job", "https://discord.com/api/webhooks/...")
//!     .with_message_break_char("…")
//!     .build()?;
//! let logger = Logger::new("backup");
//! logger.add_handler(Arc::new(handler));
//! logger.log(Level::Warn, "disk almost full");
//! # Ok::<(), discord_logging::HandlerBuildError>(())
//! ```

pub mod discord_handler;
pub mod file_config;
pub mod formatter;
pub mod handler;
pub mod handlers;
pub mod level;
#[cfg(feature = "log-compat")]
pub mod log_compat;
pub mod log_record;
pub mod logger;
mod rate_limited_warner;
pub mod stream_handler;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
#[cfg(feature = "tracing-compat")]
pub mod tracing_compat;

pub use discord_handler::{
    DiscordHandler, DiscordHandlerConfig, Embed, LevelMap, OutboundUnit, TransportError,
    UreqTransport, WebhookMessage, WebhookRequest, WebhookTransport, clip_content,
    should_format_as_code_block, split_by_break_character,
};
pub use file_config::{ConfigError, builder_from_ini_str, load_discord_builder, load_discord_handler};
pub use formatter::{DefaultFormatter, Formatter, MessageFormatter, SharedFormatter};
pub use handler::{Handler, HandlerError};
pub use handlers::{DiscordHandlerBuilder, HandlerBuildError, HandlerBuilderTrait};
pub use level::{Level, ParseLevelError};
#[cfg(feature = "log-compat")]
pub use log_compat::{LogAdapter, install_global_logger};
pub use log_record::{DISCORD_THREAD_ID_KEY, DISCORD_THREAD_NAME_KEY, LogRecord, RecordMetadata};
pub use logger::Logger;
pub use rate_limited_warner::RateLimitedWarner;
pub use stream_handler::StreamHandler;
#[cfg(feature = "tracing-compat")]
pub use tracing_compat::LoggerLayer;
