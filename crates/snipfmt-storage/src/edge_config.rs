//! Hosted Edge Config storage.
//!
//! Edge Config is a configuration-style store: reads go through a
//! read-optimized endpoint addressed by a connection string, writes go
//! through the management API as a batch of item operations. Writes become
//! visible to readers eventually, and the store has no time-to-live of its
//! own.

use crate::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// Default management API base URL.
pub const DEFAULT_API_URL: &str = "https://api.vercel.com";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Connection settings for [`EdgeConfigStorage`].
#[derive(Debug, Clone)]
pub struct EdgeConfigSettings {
    /// Read connection string, `https://edge-config.vercel.com/<id>?token=<token>`.
    pub connection_string: String,
    /// Edge Config id used by the management API.
    pub edge_config_id: String,
    /// Management API bearer token.
    pub api_token: String,
    /// Management API base URL.
    pub api_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Edge Config backed storage.
#[derive(Debug, Clone)]
pub struct EdgeConfigStorage {
    client: reqwest::Client,
    read_base: String,
    read_token: String,
    items_url: String,
    api_token: String,
}

impl EdgeConfigStorage {
    /// Create a storage from validated settings.
    ///
    /// Fails with [`StorageError::Config`] when the connection string cannot
    /// be parsed or lacks its `token` parameter, or when the id or API token
    /// is empty.
    pub fn new(settings: EdgeConfigSettings) -> StorageResult<Self> {
        let (read_base, read_token) = parse_connection_string(&settings.connection_string)?;

        if settings.edge_config_id.trim().is_empty() {
            return Err(StorageError::config("Edge Config id is empty"));
        }
        if settings.api_token.trim().is_empty() {
            return Err(StorageError::config("Edge Config API token is empty"));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("snipfmt/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()
            .map_err(|e| StorageError::config(format!("failed to build HTTP client: {e}")))?;

        let items_url = format!(
            "{}/v1/edge-config/{}/items",
            settings.api_url.trim_end_matches('/'),
            settings.edge_config_id
        );

        Ok(Self {
            client,
            read_base,
            read_token,
            items_url,
            api_token: settings.api_token,
        })
    }

    async fn patch_items(&self, items: Value) -> StorageResult<reqwest::Response> {
        let response = self
            .client
            .patch(&self.items_url)
            .bearer_auth(&self.api_token)
            .json(&json!({ "items": items }))
            .send()
            .await?;
        Ok(response)
    }
}

/// Split a connection string into its base URL and read token.
fn parse_connection_string(connection_string: &str) -> StorageResult<(String, String)> {
    let mut url = Url::parse(connection_string)
        .map_err(|e| StorageError::config(format!("invalid Edge Config connection string: {e}")))?;

    let token = url
        .query_pairs()
        .find(|(k, _)| k == "token")
        .map(|(_, v)| v.into_owned())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| StorageError::config("Edge Config connection string has no token"))?;

    url.set_query(None);
    url.set_fragment(None);
    Ok((url.as_str().trim_end_matches('/').to_string(), token))
}

/// Edge Config keys are limited to alphanumerics, `_` and `-`.
fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::invalid_key("Key cannot be empty"));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(StorageError::invalid_key(format!(
            "Edge Config keys may only contain [A-Za-z0-9_-]: {:?}",
            key
        )));
    }
    Ok(())
}

/// Turn an unsuccessful response into an error, logging the backend payload.
async fn failure(op: &str, response: reqwest::Response) -> StorageError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

    error!(
        operation = op,
        status = status.as_u16(),
        body = %body,
        "Edge Config request failed"
    );

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StorageError::config(format!("credentials rejected ({}): {}", status.as_u16(), message))
        }
        _ => StorageError::unavailable(format!("{} ({})", message, status.as_u16())),
    }
}

#[async_trait]
impl Storage for EdgeConfigStorage {
    fn name(&self) -> &'static str {
        "edge-config"
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        validate_key(key)?;
        let url = format!("{}/item/{}", self.read_base, key);
        debug!(key, "Reading Edge Config item");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.read_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let value: Value = response.json().await?;
                Ok(if value.is_null() { None } else { Some(value) })
            }
            _ => Err(failure("get", response).await),
        }
    }

    async fn upsert(&self, key: &str, value: Value) -> StorageResult<()> {
        validate_key(key)?;
        debug!(key, "Upserting Edge Config item");

        let response = self
            .patch_items(json!([{ "operation": "upsert", "key": key, "value": value }]))
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(failure("upsert", response).await)
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        debug!(key, "Deleting Edge Config item");

        let response = self
            .patch_items(json!([{ "operation": "delete", "key": key }]))
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            s if s.is_success() => Ok(()),
            _ => Err(failure("delete", response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> EdgeConfigSettings {
        EdgeConfigSettings {
            connection_string: format!("{}/ecfg_test?token=read-token", server.uri()),
            edge_config_id: "ecfg_test".to_string(),
            api_token: "api-token".to_string(),
            api_url: server.uri(),
            timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_parse_connection_string() {
        let (base, token) =
            parse_connection_string("https://edge-config.vercel.com/ecfg_abc?token=tok").unwrap();
        assert_eq!(base, "https://edge-config.vercel.com/ecfg_abc");
        assert_eq!(token, "tok");
    }

    #[test]
    fn test_parse_connection_string_without_token() {
        let err = parse_connection_string("https://edge-config.vercel.com/ecfg_abc").unwrap_err();
        assert!(err.is_config());

        let err = parse_connection_string("not a url").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_new_rejects_empty_credentials() {
        let base = EdgeConfigSettings {
            connection_string: "https://edge-config.vercel.com/ecfg_abc?token=tok".to_string(),
            edge_config_id: "ecfg_abc".to_string(),
            api_token: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        };
        assert!(EdgeConfigStorage::new(base.clone()).unwrap_err().is_config());

        let no_id = EdgeConfigSettings {
            edge_config_id: " ".to_string(),
            api_token: "t".to_string(),
            ..base
        };
        assert!(EdgeConfigStorage::new(no_id).unwrap_err().is_config());
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("aZ09_-").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("history/code").is_err());
    }

    #[tokio::test]
    async fn test_get_existing_item() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ecfg_test/item/abc"))
            .and(header("authorization", "Bearer read-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": "package main"})),
            )
            .mount(&server)
            .await;

        let storage = EdgeConfigStorage::new(settings(&server)).unwrap();
        let value = storage.get("abc").await.unwrap();
        assert_eq!(value, Some(json!({"code": "package main"})));
    }

    #[tokio::test]
    async fn test_get_missing_item() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ecfg_test/item/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let storage = EdgeConfigStorage::new(settings(&server)).unwrap();
        assert_eq!(storage.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_sends_item_operation() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v1/edge-config/ecfg_test/items"))
            .and(header("authorization", "Bearer api-token"))
            .and(body_json(json!({
                "items": [{"operation": "upsert", "key": "abc", "value": {"code": "x"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let storage = EdgeConfigStorage::new(settings(&server)).unwrap();
        storage.upsert("abc", json!({"code": "x"})).await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({"error": {"message": "internal failure"}})),
            )
            .mount(&server)
            .await;

        let storage = EdgeConfigStorage::new(settings(&server)).unwrap();
        let err = storage.upsert("abc", json!(1)).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(ref m) if m.contains("internal failure")));
    }

    #[tokio::test]
    async fn test_upsert_forbidden_is_config() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let storage = EdgeConfigStorage::new(settings(&server)).unwrap();
        let err = storage.upsert("abc", json!(1)).await.unwrap_err();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_delete_sends_delete_operation_and_tolerates_missing() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v1/edge-config/ecfg_test/items"))
            .and(body_json(json!({
                "items": [{"operation": "delete", "key": "gone"}]
            })))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let storage = EdgeConfigStorage::new(settings(&server)).unwrap();
        storage.delete("gone").await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_unavailable() {
        let settings = EdgeConfigSettings {
            connection_string: "http://127.0.0.1:9/ecfg_test?token=t".to_string(),
            edge_config_id: "ecfg_test".to_string(),
            api_token: "t".to_string(),
            api_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(2),
        };
        let storage = EdgeConfigStorage::new(settings).unwrap();
        let err = storage.get("abc").await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }
}
