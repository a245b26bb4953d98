//! Release-feed client for self-update.
//!
//! Fetches the latest release descriptor from the hosted feed, compares it
//! against the running version, and downloads the agent and uninstaller
//! assets. Requests retry on transport errors and 5xx responses with
//! exponential backoff; 4xx responses fail immediately.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Asset name of the agent executable in a release.
pub const AGENT_ASSET_NAME: &str = "gamelog-agent.exe";
/// Asset name of the uninstaller executable in a release.
pub const UNINSTALLER_ASSET_NAME: &str = "gamelog-agent-uninstaller.exe";

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// One release in the hosted feed.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub assets: Vec<ReleaseAsset>,
}

/// A downloadable artifact attached to a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl Release {
    /// Finds an asset by exact name.
    pub fn asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}

/// Binaries downloaded for an update.
pub struct UpdateBundle {
    pub version: String,
    pub agent: Vec<u8>,
    /// Absent when the release ships no uninstaller.
    pub uninstaller: Option<Vec<u8>>,
}

/// Client for the hosted release feed.
pub struct Updater {
    http: reqwest::Client,
    release_url: String,
}

impl Updater {
    /// Creates a client against `release_url`, the latest-release endpoint
    /// of the feed.
    pub fn new(release_url: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("gamelog-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, release_url })
    }

    /// Fetches the latest release descriptor.
    pub async fn latest_release(&self) -> Result<Release> {
        let body = self.get_with_retry(&self.release_url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Downloads one release asset.
    pub async fn download_asset(&self, asset: &ReleaseAsset) -> Result<Vec<u8>> {
        self.get_with_retry(&asset.browser_download_url).await
    }

    /// Checks the feed and downloads the update bundle, or returns `None`
    /// when `current_version` is already the latest release tag.
    pub async fn check_for_update(&self, current_version: &str) -> Result<Option<UpdateBundle>> {
        let release = self.latest_release().await?;
        if release.tag_name == current_version {
            return Ok(None);
        }

        let agent_asset = release
            .asset(AGENT_ASSET_NAME)
            .ok_or_else(|| Error::AssetMissing {
                release: release.tag_name.clone(),
                name: AGENT_ASSET_NAME.to_string(),
            })?;
        let agent = self.download_asset(agent_asset).await?;

        let uninstaller = match release.asset(UNINSTALLER_ASSET_NAME) {
            Some(asset) => Some(self.download_asset(asset).await?),
            None => None,
        };

        Ok(Some(UpdateBundle {
            version: release.tag_name,
            agent,
            uninstaller,
        }))
    }

    /// GET with retry on transport errors and 5xx responses.
    async fn get_with_retry(&self, url: &str) -> Result<Vec<u8>> {
        let mut delay = INITIAL_RETRY_DELAY;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match self.http.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.bytes().await?.to_vec());
                    }

                    let body = response.text().await.unwrap_or_default();
                    let error = Error::Api {
                        status: status.as_u16(),
                        body,
                    };
                    if status.is_client_error() {
                        // A 4xx will not get better on retry.
                        return Err(error);
                    }
                    error
                }
                Err(error) => Error::Http(error),
            };

            if attempt >= MAX_ATTEMPTS {
                return Err(error);
            }

            tracing::debug!(%error, attempt, "release feed request failed, retrying");
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(MAX_RETRY_DELAY);
        }
    }
}
