//! Outbound units and the webhook JSON body built from them.

use serde::Serialize;

use super::shaping::{
    clip_content, max_line_length, should_format_as_code_block, split_first_line,
};
use super::style::RecordStyle;

/// Discord embed object. Serialised field names follow the webhook API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "color")]
    pub colour: u32,
}

/// A single message resolved from one log segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundUnit {
    /// Title with optional description, coloured by severity.
    Embed(Embed),
    /// Plain content wrapped in a fenced code block.
    CodeBlock(String),
}

/// Shaping limits applied when building units.
#[derive(Clone, Copy, Debug)]
pub struct ShapeLimits {
    pub wrap_threshold: usize,
    pub max_content_len: usize,
}

impl OutboundUnit {
    /// Build the unit for one non-empty segment.
    pub fn build(segment: &str, style: &RecordStyle, limits: ShapeLimits) -> Self {
        let emoji = style.emoji_prefix.as_str();
        if !should_format_as_code_block(segment, limits.wrap_threshold) {
            return Self::Embed(Embed {
                title: format!("{emoji}{segment}"),
                description: None,
                colour: style.colour,
            });
        }

        if max_line_length(segment) > limits.wrap_threshold {
            // Long lines only survive inside a monospace block.
            let clipped = clip_content(segment, limits.max_content_len, true);
            return Self::CodeBlock(format!("```{emoji}{clipped}```"));
        }

        let (first, remainder) = split_first_line(segment);
        let description = clip_content(remainder, limits.max_content_len, true);
        Self::Embed(Embed {
            title: format!("{emoji}{first}"),
            description: Some(description.into_owned()),
            colour: style.colour,
        })
    }
}

/// JSON body of a webhook execution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WebhookMessage {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    /// Creates a forum thread with this name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,
    /// Existing thread to post into. Sent as a query parameter.
    #[serde(skip)]
    pub thread_id: Option<String>,
}

impl WebhookMessage {
    pub fn new(username: impl Into<String>, avatar_url: Option<String>) -> Self {
        Self {
            username: username.into(),
            avatar_url,
            ..Self::default()
        }
    }

    /// Plain text message, used for delivery failure notices.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_unit(mut self, unit: OutboundUnit) -> Self {
        match unit {
            OutboundUnit::Embed(embed) => self.embeds.push(embed),
            OutboundUnit::CodeBlock(text) => self.content = Some(text),
        }
        self
    }

    pub fn in_thread(mut self, thread_id: Option<String>, thread_name: Option<String>) -> Self {
        self.thread_id = thread_id;
        self.thread_name = thread_name;
        self
    }
}
