//! Client for a running snipfmt server's share API.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DEFAULT_SERVER_URL;

/// Response from share creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareCreated {
    pub share_id: String,

    /// Public URL where the snippet can be loaded.
    pub url: String,

    /// Time-to-live in milliseconds.
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    code: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Snippet sharing client.
pub struct ShareClient {
    client: reqwest::Client,
    base_url: String,
}

impl ShareClient {
    /// Create a new share client.
    pub fn new(base_url: Option<&str>) -> Self {
        let base_url = base_url
            .unwrap_or(DEFAULT_SERVER_URL)
            .trim_end_matches('/')
            .to_string();

        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("snipfmt/", env!("CARGO_PKG_VERSION")))
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Share a snippet.
    pub async fn create(&self, code: &str) -> Result<ShareCreated, ShareError> {
        if code.trim().is_empty() {
            return Err(ShareError::InvalidInput("no code to share".to_string()));
        }

        let url = format!("{}/api/share", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "code": code }))
            .send()
            .await
            .map_err(|e| ShareError::Network(e.to_string()))?;

        let created: ShareCreated = Self::read(response).await?;
        info!("Shared snippet {} at {}", created.share_id, created.url);
        Ok(created)
    }

    /// Fetch the code of a shared snippet.
    pub async fn fetch(&self, id: &str) -> Result<String, ShareError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ShareError::InvalidInput("no share id given".to_string()));
        }

        let url = format!("{}/api/share", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("id", id)])
            .send()
            .await
            .map_err(|e| ShareError::Network(e.to_string()))?;

        let body: FetchResponse = Self::read(response).await?;
        debug!("Fetched snippet {} ({} bytes)", id, body.code.len());
        Ok(body.code)
    }

    async fn read<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ShareError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(match status.as_u16() {
                404 => ShareError::NotFound,
                status => ShareError::Api { status, message },
            });
        }

        response
            .json()
            .await
            .map_err(|e| ShareError::Parse(e.to_string()))
    }
}

impl Default for ShareClient {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Error type for share operations.
#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Snippet not found or expired")]
    NotFound,

    #[error("{0}")]
    InvalidInput(String),
}
