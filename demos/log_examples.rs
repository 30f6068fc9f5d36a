//! Post a showcase of message shapes to a Discord channel.
//!
//! ```sh
//! DISCORD_TEST_WEBHOOK_URL=https://discord.com/api/webhooks/... \
//!     cargo run --example log_examples
//! ```
//!
//! Every record is also written to stderr through a `StreamHandler`.

use std::error::Error;
use std::sync::Arc;

use discord_logging::{
    DiscordHandlerBuilder, Handler, Level, LevelMap, Logger, StreamHandler, install_global_logger,
};

const AVATAR_URL: &str = "https://i0.wp.com/www.theterminatorfans.com/wp-content/uploads/2012/09/the-terminator3.jpg?resize=900%2C450&ssl=1";

fn main() -> Result<(), Box<dyn Error>> {
    let webhook_url = std::env::var("DISCORD_TEST_WEBHOOK_URL")
        .map_err(|_| "set DISCORD_TEST_WEBHOOK_URL to a channel webhook URL")?;

    let logger = Arc::new(Logger::new("root"));
    logger.set_level(Level::Debug);
    // Rate-limit notices from the transport show up on the console only.
    install_global_logger(Arc::clone(&logger));

    let plain: Arc<dyn Handler> = Arc::new(
        DiscordHandlerBuilder::new("My server log example", webhook_url.as_str())
            .with_emojis(LevelMap::new(String::new()))
            .with_avatar_url(AVATAR_URL)
            .build()?,
    );
    logger.add_handler(Arc::clone(&plain));
    logger.add_handler(Arc::new(StreamHandler::stderr()));

    logger.info(
        "Long line of text Long line of text Long line of text Long line of text Long line of \
         text  Long line of text Long line of text",
    );
    logger.info("Test title\n\n🌲 Item 1     $200,00\n🔻 Item 2     $12,123\n");
    logger.info(&format!(
        "A test with long lines in the content\n\n🌲 Item 1     {}\n🔻 Item 2     {}\n\n        \
         https://tradingstrategy.ai/trading-view\n        https://tradingstrategy.ai/blog\n",
        "$200,00 ".repeat(16).trim_end(),
        "$12,123 ".repeat(18).trim_end()
    ));
    logger.info("Line of text");
    logger.debug(&format!("Debug message {} {}", 1, 2));
    logger.info("Info message");
    logger.warn("Warning message");
    logger.error("Error message");
    logger.info("Short info message with a link https://tradingstrategy.ai");

    // Switch to a handler with the default emojis.
    logger.remove_handler(&plain);
    let with_emojis: Arc<dyn Handler> = Arc::new(
        DiscordHandlerBuilder::new("My server log example", webhook_url.as_str()).build()?,
    );
    logger.add_handler(Arc::clone(&with_emojis));
    logger.error("Error output with emojis");
    logger.warn("Warning output with emojis");
    logger.info("Info output with emojis");
    logger.error(&format!(
        "Error output with emojis with long message {}",
        "$200,00 ".repeat(16).trim_end()
    ));
    logger.error("Error output with emojis\nmultiline");

    // Switch to a handler splitting on a break character.
    logger.remove_handler(&with_emojis);
    logger.add_handler(Arc::new(
        DiscordHandlerBuilder::new("My server log example", webhook_url.as_str())
            .with_message_break_char("…")
            .build()?,
    ));
    logger.info("Message 1 … Message 2 … Message 3");

    logger.flush_handlers();
    Ok(())
}
