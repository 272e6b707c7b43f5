//! Kaggle competition file client
//!
//! Downloads a single competition file over the public REST API using
//! basic auth. The request runs on a private current-thread runtime so
//! callers stay synchronous.

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use super::ArchiveSource;
use crate::error::{LandmarkError, Result};

/// Competition holding the facial keypoints data
pub const DEFAULT_COMPETITION: &str = "facial-keypoints-detection";

/// Archive holding the training table
pub const DEFAULT_FILE_NAME: &str = "training.zip";

/// Table inside the archive
pub const DEFAULT_CSV_NAME: &str = "training.csv";

/// Configuration for the Kaggle client
#[derive(Debug, Clone)]
pub struct KaggleConfig {
    /// API base URL
    pub api_base: String,
    /// Competition slug
    pub competition: String,
    /// File to download from the competition
    pub file_name: String,
    /// Table name inside the downloaded archive
    pub csv_name: String,
    /// Account name
    pub username: Option<String>,
    /// API key
    pub key: Option<String>,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for KaggleConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.kaggle.com/api/v1".into(),
            competition: DEFAULT_COMPETITION.into(),
            file_name: DEFAULT_FILE_NAME.into(),
            csv_name: DEFAULT_CSV_NAME.into(),
            username: None,
            key: None,
            connect_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
struct KaggleCredentials {
    username: String,
    key: String,
}

impl KaggleConfig {
    /// Defaults with credentials from `KAGGLE_USERNAME`/`KAGGLE_KEY`, falling back to `kaggle.json`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(base) = std::env::var("KAGGLE_API_BASE") {
            config.api_base = base;
        }

        match (std::env::var("KAGGLE_USERNAME"), std::env::var("KAGGLE_KEY")) {
            (Ok(username), Ok(key)) => {
                config.username = Some(username);
                config.key = Some(key);
            }
            _ => {
                if let Some(path) = credentials_path() {
                    if path.is_file() {
                        let creds = read_credentials(&path)?;
                        config.username = Some(creds.username);
                        config.key = Some(creds.key);
                    }
                }
            }
        }

        Ok(config)
    }

    /// Set credentials
    pub fn with_credentials(mut self, username: impl Into<String>, key: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.key = Some(key.into());
        self
    }

    fn download_url(&self) -> String {
        format!(
            "{}/competitions/data/download/{}/{}",
            self.api_base.trim_end_matches('/'),
            self.competition,
            self.file_name
        )
    }
}

/// `$KAGGLE_CONFIG_DIR/kaggle.json`, else `~/.kaggle/kaggle.json`
fn credentials_path() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("KAGGLE_CONFIG_DIR") {
        return Some(PathBuf::from(dir).join("kaggle.json"));
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".kaggle").join("kaggle.json"))
}

fn read_credentials(path: &Path) -> Result<KaggleCredentials> {
    let text = std::fs::read_to_string(path).map_err(|e| LandmarkError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| LandmarkError::MissingCredentials {
        reason: format!("{} is malformed: {}", path.display(), e),
    })
}

/// Archive source backed by the Kaggle API
pub struct KaggleSource {
    client: Client,
    runtime: Runtime,
    config: KaggleConfig,
}

impl KaggleSource {
    /// Create a new Kaggle client
    pub fn new(config: KaggleConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| LandmarkError::StorageError {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LandmarkError::Internal {
                message: format!("Failed to create download runtime: {}", e),
            })?;

        Ok(Self {
            client,
            runtime,
            config,
        })
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (&self.config.username, &self.config.key) {
            (Some(user), Some(key)) => Ok((user.as_str(), key.as_str())),
            _ => Err(LandmarkError::MissingCredentials {
                reason: "set KAGGLE_USERNAME and KAGGLE_KEY or provide kaggle.json".into(),
            }),
        }
    }

    /// Download the configured competition file
    pub async fn download_file(&self) -> Result<Bytes> {
        let (user, key) = self.credentials()?;
        let url = self.config.download_url();
        debug!("GET {}", url);

        let resp = self
            .client
            .get(&url)
            .basic_auth(user, Some(key))
            .send()
            .await
            .map_err(|e| LandmarkError::StorageError {
                message: format!("Download failed for {}: {}", self.config.file_name, e),
            })?;

        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(LandmarkError::AuthenticationFailed {
                    reason: format!(
                        "status {} for competition {}; check credentials and accepted rules",
                        resp.status(),
                        self.config.competition
                    ),
                });
            }
            StatusCode::NOT_FOUND => {
                return Err(LandmarkError::ObjectNotFound {
                    key: format!("{}/{}", self.config.competition, self.config.file_name),
                });
            }
            status if !status.is_success() => {
                return Err(LandmarkError::StorageError {
                    message: format!("Download failed for {}: status {}", self.config.file_name, status),
                });
            }
            _ => {}
        }

        resp.bytes().await.map_err(|e| LandmarkError::StorageError {
            message: format!("Failed to read body for {}: {}", self.config.file_name, e),
        })
    }
}

impl ArchiveSource for KaggleSource {
    fn fetch(&self, dest_dir: &Path) -> Result<PathBuf> {
        info!(
            "Downloading {} from competition {}",
            self.config.file_name, self.config.competition
        );
        let data = self.runtime.block_on(self.download_file())?;

        let path = dest_dir.join(&self.config.file_name);
        std::fs::write(&path, &data).map_err(|e| LandmarkError::io(&path, e))?;
        info!("Saved {} bytes to {}", data.len(), path.display());
        Ok(path)
    }

    fn csv_name(&self) -> &str {
        &self.config.csv_name
    }
}
