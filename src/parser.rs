//! Parsing of game-client log lines into structured records.
//!
//! A well-formed line opens with a `<timestamp>` token, optionally followed
//! by a `[Level]` token, optionally followed by a second `<Kind>` token,
//! with free-form content making up the rest:
//!
//! ```text
//! <2024-01-01T00:00:00.000000000Z> [Warn] <Network> connection lost
//! ```
//!
//! Only the timestamp is mandatory. [`parse_line`] is pure; [`LineParser`]
//! wraps it with an explicit diagnostics sink for malformed-line reports.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::diagnostics::{DiagnosticsSink, TracingSink};

static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([^>]+)>\s*(?:\[([^\]]+)\])?\s*(?:<([^>]+)>)?\s*(.*)$")
        .expect("log line pattern is valid")
});

/// Log levels the game client is known to emit.
///
/// Any other text in the level token is treated as informational and mapped
/// to an absent level by the parser, not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LogLevel {
    Notice,
    Trace,
    Warn,
    Error,
}

impl LogLevel {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "Notice" => Some(Self::Notice),
            "Trace" => Some(Self::Trace),
            "Warn" => Some(Self::Warn),
            "Error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Notice => "Notice",
            Self::Trace => "Trace",
            Self::Warn => "Warn",
            Self::Error => "Error",
        };
        f.write_str(name)
    }
}

/// One structured record extracted from a raw log line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogLine {
    /// Timestamp from the leading token, nanosecond precision.
    pub time: DateTime<FixedOffset>,
    /// Recognized level, if the line carried one.
    pub level: Option<LogLevel>,
    /// Verbatim text of the secondary angle-bracket token.
    pub kind: Option<String>,
    /// Remainder of the line with surrounding whitespace trimmed.
    pub content: String,
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line does not open with a `<timestamp>` token.
    #[error("no timestamp token")]
    MissingTimestamp,

    /// The timestamp token is not a valid RFC 3339 date-time.
    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),
}

/// Parses one raw log line into a [`LogLine`].
///
/// Pure with respect to its input; reporting is left to the caller.
pub fn parse_line(raw: &str) -> Result<LogLine, ParseError> {
    let captures = LINE_PATTERN
        .captures(raw)
        .ok_or(ParseError::MissingTimestamp)?;

    let timestamp = &captures[1];
    let time = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|_| ParseError::InvalidTimestamp(timestamp.to_string()))?;

    let level = captures
        .get(2)
        .and_then(|token| LogLevel::from_token(token.as_str()));
    let kind = captures.get(3).map(|token| token.as_str().to_string());
    let content = captures[4].trim().to_string();

    Ok(LogLine {
        time,
        level,
        kind,
        content,
    })
}

/// Line parser with an explicit diagnostics sink.
pub struct LineParser<S = TracingSink> {
    sink: S,
}

impl LineParser<TracingSink> {
    /// Creates a parser that reports malformed lines through `tracing`.
    pub fn new() -> Self {
        Self { sink: TracingSink }
    }
}

impl Default for LineParser<TracingSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DiagnosticsSink> LineParser<S> {
    /// Creates a parser that reports malformed lines to `sink`.
    pub fn with_sink(sink: S) -> Self {
        Self { sink }
    }

    /// Parses `raw`, reporting failures to the sink.
    ///
    /// Returns `None` for unparseable lines; the caller simply skips them.
    pub fn parse(&self, raw: &str) -> Option<LogLine> {
        match parse_line(raw) {
            Ok(line) => Some(line),
            Err(error) => {
                self.sink.malformed_line(raw, &error);
                None
            }
        }
    }
}
