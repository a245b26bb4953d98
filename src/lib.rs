//! Background agent core for watching a game-client log file.
//!
//! The crate tails a continuously growing log file and turns its
//! semi-structured lines into typed events: [`tail_file`] produces an
//! ordered stream of raw lines that survives the watched file being
//! missing, truncated, or replaced, and [`LineParser`] extracts the
//! timestamp, level, category, and content from each line.
//!
//! # Example
//!
//! ```rust,no_run
//! use gamelog_agent::{LineParser, tail_file};
//! use tokio_stream::StreamExt;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut lines = tail_file("Game.log", CancellationToken::new());
//!     let parser = LineParser::new();
//!
//!     while let Some(raw) = lines.next().await {
//!         if let Some(event) = parser.parse(&raw) {
//!             println!("{} {}", event.time, event.content);
//!         }
//!     }
//! }
//! ```

// Internal modules - not part of public API
mod config;
mod diagnostics;
mod error;
mod parser;
mod startup;
mod tailer;
mod updater;

#[cfg(test)]
mod test_helpers;

// Public API exports
pub use config::Config;
pub use diagnostics::{DiagnosticsSink, TracingSink};
pub use error::{Error, Result};
pub use parser::{LineParser, LogLevel, LogLine, ParseError, parse_line};
pub use startup::set_run_at_login;
pub use tailer::{TailStream, tail_file};
pub use updater::{
    AGENT_ASSET_NAME, Release, ReleaseAsset, UNINSTALLER_ASSET_NAME, UpdateBundle, Updater,
};
