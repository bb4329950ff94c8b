//! Remote formatter client and live (debounced) formatting.
//!
//! Formatting is delegated to an HTTP service that accepts `{"code": ...}`
//! and answers with `{"formattedCode": ...}` or `{"error": ...}`.
//!
//! [`LiveFormatter`] sits between an editor and the service. Each edit gets
//! a sequence number; a request is only sent after the debounce window
//! passes without a newer edit, and a response is only published if no
//! newer edit was submitted while it was in flight. Superseded requests are
//! left to finish and their results are dropped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Per-request timeout for the remote formatter.
pub const FORMAT_TIMEOUT: Duration = Duration::from_secs(10);

/// Formatter error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The formatter refused the input, typically a syntax error.
    #[error("{0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Formatter error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Something that formats source text.
#[async_trait]
pub trait Formatter: Send + Sync {
    async fn format(&self, code: &str) -> Result<String, FormatError>;
}

#[derive(Debug, Serialize)]
struct FormatRequest<'a> {
    code: &'a str,
}

/// Formatter service response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// HTTP client for the formatter service.
#[derive(Debug, Clone)]
pub struct RemoteFormatter {
    client: reqwest::Client,
    url: String,
}

impl RemoteFormatter {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("snipfmt/", env!("CARGO_PKG_VERSION")))
                .timeout(FORMAT_TIMEOUT)
                .build()
                .unwrap_or_default(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Formatter for RemoteFormatter {
    async fn format(&self, code: &str) -> Result<String, FormatError> {
        if code.trim().is_empty() {
            return Ok(String::new());
        }

        let response = self
            .client
            .post(&self.url)
            .json(&FormatRequest { code })
            .send()
            .await
            .map_err(|e| FormatError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FormatError::Network(e.to_string()))?;

        // The service reports formatting failures as `{error}`, sometimes
        // with a non-2xx status.
        match serde_json::from_str::<FormatResponse>(&body) {
            Ok(FormatResponse {
                error: Some(error), ..
            }) => Err(FormatError::Rejected(error)),
            Ok(FormatResponse {
                formatted_code: Some(formatted),
                ..
            }) if status.is_success() => Ok(formatted),
            _ if !status.is_success() => Err(FormatError::Api {
                status: status.as_u16(),
                message: body,
            }),
            Ok(_) => Err(FormatError::Parse(
                "response has neither formattedCode nor error".to_string(),
            )),
            Err(e) => Err(FormatError::Parse(e.to_string())),
        }
    }
}

/// A published live-format result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOutcome {
    /// Sequence number of the edit this result belongs to.
    pub seq: u64,
    pub result: Result<String, FormatError>,
}

/// Debounced formatter that only publishes the result of the latest edit.
pub struct LiveFormatter<F> {
    formatter: Arc<F>,
    debounce: Duration,
    latest: Arc<AtomicU64>,
    tx: Arc<watch::Sender<Option<FormatOutcome>>>,
}

impl<F: Formatter + 'static> LiveFormatter<F> {
    pub fn new(formatter: F, debounce: Duration) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            formatter: Arc::new(formatter),
            debounce,
            latest: Arc::new(AtomicU64::new(0)),
            tx: Arc::new(tx),
        }
    }

    /// Observe published results.
    pub fn subscribe(&self) -> watch::Receiver<Option<FormatOutcome>> {
        self.tx.subscribe()
    }

    /// Sequence number of the most recent submission (0 before any).
    pub fn latest_seq(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Submit the current editor text. Returns its sequence number.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, text: impl Into<String>) -> u64 {
        let text = text.into();
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        let formatter = Arc::clone(&self.formatter);
        let latest = Arc::clone(&self.latest);
        let tx = Arc::clone(&self.tx);
        let debounce = self.debounce;

        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if latest.load(Ordering::SeqCst) != seq {
                return;
            }

            debug!(seq, bytes = text.len(), "Sending format request");
            let result = formatter.format(&text).await;

            if latest.load(Ordering::SeqCst) != seq {
                debug!(seq, "Dropping superseded format result");
                return;
            }
            tx.send_replace(Some(FormatOutcome { seq, result }));
        });

        seq
    }
}
