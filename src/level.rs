use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Severity attached to every [`LogRecord`](crate::log_record::LogRecord).
///
/// The ordering follows increasing severity so thresholds can be compared
/// with `>=`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl Default for Level {
    fn default() -> Self {
        Self::Info
    }
}

impl Level {
    /// Every level in ascending order of severity.
    pub const ALL: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    pub fn parse_or_info(s: &str) -> Self {
        s.parse().unwrap_or(Self::Info)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known level.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Self::Trace),
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" | "FATAL" => Ok(Self::Critical),
            _ => Err(ParseLevelError(s.to_owned())),
        }
    }
}

impl TryFrom<u8> for Level {
    type Error = ParseLevelError;

    fn try_from(value: u8) -> Result<Self, ParseLevelError> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| ParseLevelError(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("info", Level::Info)]
    #[case("WARNING", Level::Warn)]
    #[case(" error ", Level::Error)]
    #[case("fatal", Level::Critical)]
    fn parses_level_names(#[case] input: &str, #[case] expected: Level) {
        assert_eq!(input.parse::<Level>(), Ok(expected));
    }

    #[test]
    fn rejects_notset() {
        assert!("NOTSET".parse::<Level>().is_err());
        assert_eq!(Level::parse_or_info("bogus"), Level::Info);
    }

    #[test]
    fn u8_round_trip_covers_all_levels() {
        for level in Level::ALL {
            assert_eq!(Level::try_from(level as u8), Ok(level));
        }
        assert!(Level::try_from(42).is_err());
    }
}
