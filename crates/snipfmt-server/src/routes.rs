//! HTTP routes for the server.

use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snipfmt_core::{FormatError, StoreError};
use snipfmt_storage::{Storage, StorageError};
use snipfmt_util::{Clock, SystemClock};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, warn};

/// Storage key written and read back by the storage check.
const CHECK_KEY: &str = "storage-check";

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/share", get(share_get).post(share_create))
        .route("/api/format", post(format_code))
        .route("/api/storage/check", get(storage_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

impl ApiError {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    fn bad_request(msg: impl Into<String>) -> (StatusCode, Json<Self>) {
        (StatusCode::BAD_REQUEST, Json(Self::new(msg)))
    }

    fn bad_gateway(msg: impl Into<String>) -> (StatusCode, Json<Self>) {
        (StatusCode::BAD_GATEWAY, Json(Self::new(msg)))
    }

    fn from_store(err: StoreError) -> (StatusCode, Json<Self>) {
        let status = match err {
            StoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound => StatusCode::NOT_FOUND,
            StoreError::BackendUnavailable(_) | StoreError::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(Self::new(err.user_message())))
    }
}

/// Pull a string `code` field out of a JSON body.
fn code_field(body: Result<Json<Value>, JsonRejection>) -> ApiResult<String> {
    let Json(body) = body.map_err(|e| {
        debug!(error = %e, "Rejected request body");
        ApiError::bad_request("Request body must be JSON")
    })?;
    match body.get("code") {
        Some(Value::String(code)) => Ok(code.clone()),
        Some(_) => Err(ApiError::bad_request("code must be a string")),
        None => Err(ApiError::bad_request("code is required")),
    }
}

// =============================================================================
// Global endpoints
// =============================================================================

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// =============================================================================
// Share endpoints
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShareCreatedResponse {
    share_id: String,
    url: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct ShareQuery {
    id: Option<String>,
}

async fn share_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let code = code_field(body)?;

    let origin = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && *v != "null")
        .unwrap_or(&*state.public_url);

    let receipt = state
        .store
        .put(&code, origin)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ShareCreatedResponse {
        share_id: receipt.id,
        url: receipt.url,
        expires_in: receipt.expires_in,
    }))
}

async fn share_get(
    State(state): State<AppState>,
    query: Result<Query<ShareQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = query
        .ok()
        .and_then(|Query(q)| q.id)
        .unwrap_or_default();

    let record = state.store.get(&id).await.map_err(ApiError::from_store)?;
    Ok(Json(serde_json::json!({ "code": record.text })))
}

// =============================================================================
// Format endpoint
// =============================================================================

async fn format_code(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let code = code_field(body)?;

    match state.formatter.format(&code).await {
        Ok(formatted) => Ok(Json(serde_json::json!({ "formattedCode": formatted }))),
        Err(FormatError::Rejected(message)) => Ok(Json(serde_json::json!({ "error": message }))),
        Err(e) => {
            error!(error = %e, "Formatter request failed");
            Err(ApiError::bad_gateway("Formatter is unavailable"))
        }
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

#[derive(Debug, Serialize)]
struct StorageCheck {
    ok: bool,
    backend: &'static str,
    credentials: serde_json::Map<String, Value>,
    write: bool,
    read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Write and read back a check record.
async fn storage_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage = state.store.storage();
    let credentials = state
        .credentials
        .iter()
        .map(|(name, present)| (name.to_string(), Value::Bool(*present)))
        .collect();

    let mut check = StorageCheck {
        ok: false,
        backend: storage.name(),
        credentials,
        write: false,
        read: false,
        error: None,
    };

    let record = serde_json::json!({ "checkedAt": SystemClock.now_millis() });
    let result = async {
        storage.upsert(CHECK_KEY, record.clone()).await?;
        check.write = true;
        let read_back = storage.get(CHECK_KEY).await?;
        check.read = read_back.as_ref() == Some(&record);
        if let Err(e) = storage.delete(CHECK_KEY).await {
            warn!(error = %e, "Failed to remove storage check record");
        }
        Ok::<_, StorageError>(())
    }
    .await;

    if let Err(e) = result {
        error!(backend = check.backend, error = %e, "Storage check failed");
        check.error = Some(StoreError::from(e).user_message());
    }
    check.ok = check.write && check.read;

    let status = if check.ok {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(check))
}
