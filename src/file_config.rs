//! INI configuration for the Discord handler.
//!
//! A section such as
//!
//! ```ini
//! [discord]
//! service_name = Backup job
//! webhook_url_env = DISCORD_WEBHOOK_URL
//! message_break_char = …
//! level = WARNING
//! colours = NOTSET:2040357, ERROR:#db2828
//! emojis = NOTSET:, CRITICAL:🆘
//! ```
//!
//! is turned into a [`DiscordHandlerBuilder`] using the `rust-ini` crate.
//! Every key except `service_name` and the webhook URL is optional. Map
//! values are `LEVEL:value` pairs separated by commas and must include a
//! `NOTSET` fallback entry.

use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use ini::{Ini, Properties};
use thiserror::Error;

use crate::discord_handler::{DiscordHandler, FALLBACK_KEY, LevelMap};
use crate::handlers::{DiscordHandlerBuilder, HandlerBuildError};
use crate::level::Level;

/// Errors raised while loading handler configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),
    #[error("configuration is invalid: {0}")]
    Parse(#[from] ini::ParseError),
    #[error("configuration has no [{0}] section")]
    MissingSection(String),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
    #[error("environment variable {0} is not set")]
    MissingEnv(String),
    #[error(transparent)]
    Build(#[from] HandlerBuildError),
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_owned(),
        value: value.to_owned(),
    }
}

/// Read `path` and build a [`DiscordHandlerBuilder`] from `section`.
pub fn load_discord_builder(
    path: impl AsRef<Path>,
    section: &str,
) -> Result<DiscordHandlerBuilder, ConfigError> {
    let text = fs::read_to_string(path)?;
    builder_from_ini_str(&text, section)
}

/// Read `path` and build the handler described by `section`.
pub fn load_discord_handler(
    path: impl AsRef<Path>,
    section: &str,
) -> Result<DiscordHandler, ConfigError> {
    Ok(load_discord_builder(path, section)?.build()?)
}

/// Build a [`DiscordHandlerBuilder`] from INI `text`.
pub fn builder_from_ini_str(text: &str, section: &str) -> Result<DiscordHandlerBuilder, ConfigError> {
    builder_from_ini_with_env(text, section, |name| std::env::var(name).ok())
}

pub(crate) fn builder_from_ini_with_env<E>(
    text: &str,
    section: &str,
    env: E,
) -> Result<DiscordHandlerBuilder, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let ini = Ini::load_from_str(text)?;
    let props = ini
        .section(Some(section))
        .ok_or_else(|| ConfigError::MissingSection(section.to_owned()))?;

    let mut builder = DiscordHandlerBuilder::default();
    if let Some(name) = props.get("service_name") {
        builder = builder.with_service_name(name);
    }
    if let Some(url) = webhook_url(props, &env)? {
        builder = builder.with_webhook_url(url);
    }
    if let Some(url) = props.get("avatar_url") {
        builder = builder.with_avatar_url(url);
    }
    if let Some(token) = props.get("message_break_char") {
        builder = builder.with_message_break_char(token);
    }
    if let Some(flag) = parsed(props, "rate_limit_retry", parse_bool)? {
        builder = builder.with_rate_limit_retry(flag);
    }
    if let Some(threshold) =
        parsed(props, "embed_line_wrap_threshold", |v| v.parse::<usize>().ok())?
    {
        builder = builder.with_embed_line_wrap_threshold(threshold);
    }
    if let Some(max_len) = parsed(props, "max_content_len", |v| v.parse::<usize>().ok())? {
        builder = builder.with_max_content_len(max_len);
    }
    if let Some(timeout) = parsed(props, "timeout_ms", |v| v.parse::<u64>().ok())? {
        builder = builder.with_timeout_ms(timeout);
    }
    if let Some(level) = parsed(props, "level", |v| Level::from_str(v).ok())? {
        builder = builder.with_level(level);
    }
    if let Some(raw) = props.get("colours") {
        builder = builder.with_colours(parse_level_map(raw, "colours", parse_colour)?);
    }
    if let Some(raw) = props.get("emojis") {
        builder = builder.with_emojis(parse_level_map(raw, "emojis", |v| Some(v.to_owned()))?);
    }
    Ok(builder)
}

/// `webhook_url` wins over `webhook_url_env`.
fn webhook_url<E>(props: &Properties, env: &E) -> Result<Option<String>, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    if let Some(url) = props.get("webhook_url") {
        return Ok(Some(url.to_owned()));
    }
    match props.get("webhook_url_env") {
        Some(name) => env(name)
            .map(Some)
            .ok_or_else(|| ConfigError::MissingEnv(name.to_owned())),
        None => Ok(None),
    }
}

fn parsed<T>(
    props: &Properties,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, ConfigError> {
    props
        .get(key)
        .map(|raw| parse(raw.trim()).ok_or_else(|| invalid(key, raw)))
        .transpose()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Accepts decimal, `0x`-prefixed hex or `#`-prefixed hex.
fn parse_colour(value: &str) -> Option<u32> {
    let colour = if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .or_else(|| value.strip_prefix('#'))
    {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        value.parse().ok()?
    };
    (colour <= 0xFF_FFFF).then_some(colour)
}

fn parse_level_map<T>(
    raw: &str,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<LevelMap<T>, ConfigError> {
    let mut entries = Vec::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, value) = pair.split_once(':').ok_or_else(|| invalid(key, pair))?;
        let name = name.trim();
        let level = if name.eq_ignore_ascii_case(FALLBACK_KEY) {
            None
        } else {
            Some(Level::from_str(name).map_err(|_| invalid(key, pair))?)
        };
        let value = parse(value.trim()).ok_or_else(|| invalid(key, pair))?;
        entries.push((level, value));
    }
    Ok(LevelMap::from_entries(entries, key)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerBuilderTrait;
    use crate::testing::RecordingTransport;
    use rstest::rstest;
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    const FULL: &str = "[discord]
service_name = Backup job
webhook_url = https://discord.com/api/webhooks/1/abc
avatar_url = https://example.com/bot.png
rate_limit_retry = no
embed_line_wrap_threshold = 80
message_break_char = …
timeout_ms = 2500
max_content_len = 1500
level = WARNING
colours = NOTSET:2040357, ERROR:#db2828, WARN:0xFBBD08
emojis = NOTSET:, CRITICAL:🆘
";

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn build(builder: DiscordHandlerBuilder) -> Result<DiscordHandler, HandlerBuildError> {
        builder
            .with_transport(Arc::new(RecordingTransport::new()))
            .build_inner()
    }

    #[test]
    fn reads_every_key() {
        let builder = builder_from_ini_with_env(FULL, "discord", no_env).expect("valid ini");
        let handler = build(builder).expect("valid builder");
        let config = handler.config();
        assert_eq!(config.service_name, "Backup job");
        assert_eq!(config.webhook_url, "https://discord.com/api/webhooks/1/abc");
        assert_eq!(config.avatar_url.as_deref(), Some("https://example.com/bot.png"));
        assert!(!config.rate_limit_retry);
        assert_eq!(config.embed_line_wrap_threshold, 80);
        assert_eq!(config.message_break_char.as_deref(), Some("…"));
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.max_content_len, 1500);
        assert_eq!(config.level, Level::Warn);
        assert_eq!(*config.colours.resolve(Level::Error), 0xDB2828);
        assert_eq!(*config.colours.resolve(Level::Warn), 0xFBBD08);
        assert_eq!(*config.colours.resolve(Level::Info), 2_040_357);
        assert_eq!(config.emojis.resolve(Level::Critical), "🆘");
        assert_eq!(config.emojis.resolve(Level::Error), "");
    }

    #[test]
    fn webhook_url_can_come_from_environment() {
        let text = "[discord]\nservice_name = svc\nwebhook_url_env = HOOK\n";
        let builder = builder_from_ini_with_env(text, "discord", |name| {
            (name == "HOOK").then(|| "https://discord.com/api/webhooks/2/x".to_owned())
        })
        .expect("env var present");
        let handler = build(builder).expect("valid builder");
        assert_eq!(handler.config().webhook_url, "https://discord.com/api/webhooks/2/x");

        let err = builder_from_ini_with_env(text, "discord", no_env).expect_err("env var absent");
        assert!(matches!(err, ConfigError::MissingEnv(name) if name == "HOOK"));
    }

    #[rstest]
    #[case("rate_limit_retry = maybe", "rate_limit_retry")]
    #[case("timeout_ms = soon", "timeout_ms")]
    #[case("level = LOUD", "level")]
    #[case("colours = NOTSET:#zzzzzz", "colours")]
    #[case("colours = NOTSET:16777216", "colours")]
    #[case("emojis = NOTSET, ERROR:x", "emojis")]
    #[case("emojis = NOTSET:, SEVERE:x", "emojis")]
    fn rejects_invalid_values(#[case] line: &str, #[case] key: &str) {
        let text = format!("[discord]\nservice_name = svc\nwebhook_url = http://h\n{line}\n");
        let err = builder_from_ini_with_env(&text, "discord", no_env).expect_err("invalid value");
        assert!(
            matches!(&err, ConfigError::InvalidValue { key: k, .. } if k == key),
            "{err:?}"
        );
    }

    #[test]
    fn maps_require_a_fallback() {
        let text = "[discord]\ncolours = ERROR:1\n";
        let err = builder_from_ini_with_env(text, "discord", no_env).expect_err("no NOTSET");
        assert!(err.to_string().contains("colours map requires a NOTSET fallback entry"));
    }

    #[test]
    fn missing_section_is_reported() {
        let err = builder_from_ini_with_env(FULL, "other", no_env).expect_err("no section");
        assert!(matches!(err, ConfigError::MissingSection(name) if name == "other"));
    }

    #[test]
    fn missing_required_keys_fail_at_build() {
        let builder =
            builder_from_ini_with_env("[discord]\nlevel = INFO\n", "discord", no_env).expect("parses");
        let err = build(builder).expect_err("no service name");
        assert!(err.to_string().contains("requires a service name"));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = NamedTempFile::new().expect("create temp ini file");
        file.write_all(FULL.as_bytes()).expect("write ini contents");
        let builder = load_discord_builder(file.path(), "discord").expect("should parse");
        let handler = build(builder).expect("valid builder");
        assert_eq!(handler.config().service_name, "Backup job");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = load_discord_builder(dir.path().join("absent.ini"), "discord")
            .expect_err("no file");
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
