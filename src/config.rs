//! Agent configuration.
//!
//! Settings live in `config.toml` under the user config directory; every
//! field has a default so the agent runs without any file present.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Repository (`owner/name`) serving release updates by default.
const DEFAULT_RELEASE_REPO: &str = "gamelog/gamelog-agent";

/// Agent settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log file written by the game client.
    pub log_path: PathBuf,
    /// Directory the agent binaries are installed into.
    pub install_dir: PathBuf,
    /// Repository (`owner/name`) serving release updates.
    pub release_repo: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("Game.log"),
            install_dir: default_install_dir(),
            release_repo: DEFAULT_RELEASE_REPO.to_string(),
        }
    }
}

impl Config {
    /// Loads the config file from the user config directory, falling back
    /// to defaults when it does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path()?)
    }

    /// Loads a config file from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Ok(toml::from_str(&raw)?),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(error.into()),
        }
    }

    /// Latest-release endpoint of the configured release feed.
    pub fn latest_release_url(&self) -> String {
        format!(
            "https://api.github.com/repos/{}/releases/latest",
            self.release_repo
        )
    }
}

fn config_file_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().ok_or(Error::ConfigDirNotFound)?;
    Ok(dir.join("gamelog-agent").join("config.toml"))
}

fn default_install_dir() -> PathBuf {
    #[cfg(windows)]
    {
        PathBuf::from(r"C:\Program Files\gamelog-agent")
    }
    #[cfg(not(windows))]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gamelog-agent")
    }
}
