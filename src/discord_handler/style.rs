//! Per-level colour and emoji decoration.
//!
//! A [`LevelMap`] always carries a fallback value (the "no level" entry), so
//! resolving a style for any [`Level`] cannot fail once the map exists.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::handlers::HandlerBuildError;
use crate::level::Level;

/// Name used for the fallback entry in textual configuration.
pub const FALLBACK_KEY: &str = "NOTSET";

static DEFAULT_COLOURS: Lazy<LevelMap<u32>> = Lazy::new(|| {
    LevelMap::new(2_040_357)
        .with(Level::Critical, 14_362_664) // red
        .with(Level::Error, 14_362_664) // red
        .with(Level::Warn, 16_497_928) // yellow
        .with(Level::Info, 2_196_944) // blue
        .with(Level::Debug, 8_947_848) // gray
});

static DEFAULT_EMOJIS: Lazy<LevelMap<String>> = Lazy::new(|| {
    LevelMap::new(String::new())
        .with(Level::Critical, "🆘".to_owned())
        .with(Level::Error, "❌".to_owned())
        .with(Level::Warn, "⚠️".to_owned())
        .with(Level::Info, String::new())
        .with(Level::Debug, String::new())
});

/// Embed colours used when none are configured.
pub fn default_colours() -> LevelMap<u32> {
    DEFAULT_COLOURS.clone()
}

/// Emoji prefixes used when none are configured.
pub fn default_emojis() -> LevelMap<String> {
    DEFAULT_EMOJIS.clone()
}

/// Mapping from [`Level`] to a value with a mandatory fallback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelMap<T> {
    fallback: T,
    levels: BTreeMap<Level, T>,
}

impl<T> LevelMap<T> {
    /// Create a map where every level resolves to `fallback`.
    pub fn new(fallback: T) -> Self {
        Self {
            fallback,
            levels: BTreeMap::new(),
        }
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with(mut self, level: Level, value: T) -> Self {
        self.insert(level, value);
        self
    }

    pub fn insert(&mut self, level: Level, value: T) {
        self.levels.insert(level, value);
    }

    /// Value configured for `level`, without falling back.
    pub fn get(&self, level: Level) -> Option<&T> {
        self.levels.get(&level)
    }

    /// Value for `level`, or the fallback entry when `level` is absent.
    pub fn resolve(&self, level: Level) -> &T {
        self.levels.get(&level).unwrap_or(&self.fallback)
    }

    pub fn fallback(&self) -> &T {
        &self.fallback
    }

    /// Build a map from `(level, value)` pairs where `None` marks the
    /// fallback entry.
    ///
    /// `what` names the map in the error returned when no fallback entry is
    /// present.
    pub fn from_entries<I>(entries: I, what: &str) -> Result<Self, HandlerBuildError>
    where
        I: IntoIterator<Item = (Option<Level>, T)>,
    {
        let mut fallback = None;
        let mut levels = BTreeMap::new();
        for (level, value) in entries {
            match level {
                Some(level) => {
                    levels.insert(level, value);
                }
                None => fallback = Some(value),
            }
        }
        let fallback = fallback.ok_or_else(|| {
            HandlerBuildError::InvalidConfig(format!(
                "{what} map requires a {FALLBACK_KEY} fallback entry"
            ))
        })?;
        Ok(Self { fallback, levels })
    }
}

/// Colour and emoji resolved for a single record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordStyle {
    /// Embed colour as a 24-bit RGB integer.
    pub colour: u32,
    /// Emoji prefix including its trailing space, or empty.
    pub emoji_prefix: String,
}

impl RecordStyle {
    pub fn resolve(level: Level, colours: &LevelMap<u32>, emojis: &LevelMap<String>) -> Self {
        let emoji = emojis.resolve(level);
        let emoji_prefix = if emoji.is_empty() {
            String::new()
        } else {
            format!("{emoji} ")
        };
        Self {
            colour: *colours.resolve(level),
            emoji_prefix,
        }
    }
}
