//! Error types for the agent.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for agent operations.
///
/// The tailing task never surfaces errors through its line stream; these
/// variants cover the surrounding concerns (configuration, the release
/// feed, startup registration).
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport errors from the release feed client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success responses from the release feed.
    #[error("release feed error {status}: {body}")]
    Api { status: u16, body: String },

    /// JSON errors when decoding release metadata.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file parse errors.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A release is missing a required asset.
    #[error("release {release} has no asset named {name}")]
    AssetMissing { release: String, name: String },

    /// The binary to register for startup does not exist.
    #[error("binary does not exist: {0}")]
    MissingBinary(PathBuf),

    /// User config directory could not be determined.
    #[error("config directory not found")]
    ConfigDirNotFound,

    /// Startup registration is a Windows-only facility.
    #[error("run-at-login management is only supported on Windows")]
    StartupUnsupported,
}

/// A convenient Result type for agent operations.
pub type Result<T> = std::result::Result<T, Error>;
