//! End-to-end tests driving the Discord handler through a `Logger`.

use std::sync::Arc;

use discord_logging::{
    DiscordHandlerBuilder, Level, LevelMap, LogRecord, Logger,
    discord_handler::DISCORD_CONTENT_LIMIT,
    testing::{RecordingTransport, SharedBuf},
};
use rstest::{fixture, rstest};

struct Harness {
    logger: Logger,
    transport: RecordingTransport,
    diagnostics: SharedBuf,
}

impl Harness {
    fn new(configure: impl FnOnce(DiscordHandlerBuilder) -> DiscordHandlerBuilder) -> Self {
        let transport = RecordingTransport::new();
        let diagnostics = SharedBuf::default();
        let builder = DiscordHandlerBuilder::new("Hello World Bot", "https://discord.test/hook")
            .with_transport(Arc::new(transport.clone()))
            .with_diagnostics(diagnostics.clone());
        let handler = configure(builder).build().expect("valid builder");
        let logger = Logger::new("showcase");
        logger.set_level(Level::Debug);
        logger.add_handler(Arc::new(handler));
        Self {
            logger,
            transport,
            diagnostics,
        }
    }

    fn bodies(&self) -> Vec<serde_json::Value> {
        self.transport
            .requests()
            .iter()
            .map(|r| serde_json::to_value(&r.message).expect("serialise"))
            .collect()
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new(|b| b)
}

#[rstest]
fn showcase_levels_are_coloured(harness: Harness) {
    harness.logger.debug("Debug message");
    harness.logger.info("Info message");
    harness.logger.warn("Warning message");
    harness.logger.error("Error message");
    harness.logger.critical("Critical message");

    let bodies = harness.bodies();
    let embeds: Vec<(String, u64)> = bodies
        .iter()
        .map(|b| {
            let embed = &b["embeds"][0];
            (
                embed["title"].as_str().unwrap_or_default().to_owned(),
                embed["color"].as_u64().unwrap_or_default(),
            )
        })
        .collect();
    assert_eq!(
        embeds,
        [
            ("Debug message".to_owned(), 8_947_848),
            ("Info message".to_owned(), 2_196_944),
            ("⚠️ Warning message".to_owned(), 16_497_928),
            ("❌ Error message".to_owned(), 14_362_664),
            ("🆘 Critical message".to_owned(), 14_362_664),
        ]
    );
    assert!(bodies.iter().all(|b| b["username"] == "Hello World Bot"));
}

#[rstest]
fn table_output_keeps_layout_in_code_block(harness: Harness) {
    let header = format!("{:<30}{:<15}{:<15}{}", "Item", "Price", "Quantity", "Total");
    let row = format!("{:<30}{:<15}{:<15}{}", "Apple", "$1,00", "10", "$10,00");
    let table = format!("Test title\n\n{header}\n{row}\n");
    harness.logger.info(&table);

    let bodies = harness.bodies();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["content"], format!("```{table}```"));
    assert!(bodies[0].get("embeds").is_none());
}

#[rstest]
fn short_multi_line_output_uses_description(harness: Harness) {
    harness
        .logger
        .info("Test title\nItem 1     $200,00\nItem 2     $12,123");

    let embed = &harness.bodies()[0]["embeds"][0];
    assert_eq!(embed["title"], "Test title");
    assert_eq!(embed["description"], "Item 1     $200,00\nItem 2     $12,123");
}

#[test]
fn long_output_is_split_on_break_character() {
    let harness = Harness::new(|b| b.with_message_break_char("…"));
    let first = "a".repeat(1500);
    let second = "b".repeat(1500);
    harness.logger.info(&format!("{first}…{second}"));

    let bodies = harness.bodies();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["content"], format!("```{first}```"));
    assert_eq!(bodies[1]["content"], format!("```{second}```"));
}

#[test]
fn oversized_output_is_clipped_to_its_tail() {
    let harness = Harness::new(|b| b);
    let message = format!("{}END", "x".repeat(2500));
    harness.logger.error(&message);

    let content = harness.bodies()[0]["content"]
        .as_str()
        .expect("code block content")
        .to_owned();
    let expected_tail = format!("{}END", "x".repeat(1897));
    assert_eq!(content, format!("```❌ ...{expected_tail}```"));
    assert!(content.chars().count() <= DISCORD_CONTENT_LIMIT);
}

#[test]
fn custom_maps_replace_defaults() {
    let harness = Harness::new(|b| {
        b.with_colours(LevelMap::new(7).with(Level::Error, 9))
            .with_emojis(LevelMap::new(String::new()).with(Level::Info, "ℹ️".to_owned()))
    });
    harness.logger.info("custom");
    harness.logger.error("plain");

    let bodies = harness.bodies();
    assert_eq!(bodies[0]["embeds"][0]["title"], "ℹ️ custom");
    assert_eq!(bodies[0]["embeds"][0]["color"], 7);
    assert_eq!(bodies[1]["embeds"][0]["title"], "plain");
    assert_eq!(bodies[1]["embeds"][0]["color"], 9);
}

#[test]
fn thread_routing_survives_logger_dispatch() {
    let harness = Harness::new(|b| b);
    harness
        .logger
        .dispatch_record(LogRecord::new("showcase", Level::Info, "in thread").in_discord_thread("77"));

    let requests = harness.transport.requests();
    assert_eq!(requests[0].message.thread_id.as_deref(), Some("77"));
}

#[test]
fn failed_delivery_is_reported_without_reaching_logger_caller() {
    let harness = Harness::new(|b| b);
    harness.transport.push_status(404, "{\"message\": \"Unknown Webhook\"}");

    harness.logger.warn("lost");
    harness.logger.warn("delivered");

    let requests = harness.transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(
        requests[1].message.content.as_deref(),
        Some("Failed to deliver log message: 404: {\"message\": \"Unknown Webhook\"}")
    );
    let diagnostics = harness.diagnostics.text();
    assert!(diagnostics.contains("Discord webhook request failed: 404"));
    assert!(diagnostics.contains("Error from Discord logger"));
}
