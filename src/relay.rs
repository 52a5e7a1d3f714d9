//! Server-side relay endpoint.
//!
//! The relay holds the Gemini API key and forwards `{model, contents,
//! config}` bodies to the upstream `generateContent` call. It keeps no state
//! and never retries: a 200 passes the upstream body through verbatim, any
//! failure comes back as HTTP 500 with a JSON `{"error": ...}` body.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Shared relay state. Cloning is cheap; the reqwest client is internally
/// reference-counted.
#[derive(Clone)]
pub struct RelayState {
    client: reqwest::Client,
    api_key: String,
    upstream_base: String,
}

impl RelayState {
    /// Creates relay state for the given upstream and server-held key.
    pub fn new(upstream_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            upstream_base: upstream_base.into().trim_end_matches('/').to_string(),
        }
    }
}

/// A generation request as received from the client.
#[derive(Debug, Serialize, Deserialize)]
pub struct RelayRequest {
    /// Model identifier, interpolated into the upstream path.
    pub model: String,
    /// Content parts (reference images plus the text instruction).
    pub contents: Value,
    /// Generation configuration object, forwarded as `generationConfig`.
    pub config: Value,
}

/// Builds the relay router.
pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/api/generate", post(handle_generate))
        .route("/api/key-check", get(handle_key_check))
        .route("/health", get(handle_health))
        .with_state(state)
}

async fn handle_health() -> &'static str {
    "ok"
}

/// Probes the upstream with the server-held key so clients can tell a live
/// relay with a bad key apart from a usable one.
async fn handle_key_check(State(state): State<RelayState>) -> Response {
    let url = format!(
        "{}/v1beta/models/{}",
        state.upstream_base,
        crate::render::MODEL_NAME,
    );

    let response = match state
        .client
        .get(&url)
        .header("x-goog-api-key", &state.api_key)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => return error_response(e.to_string()),
    };

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "upstream key check failed");
        return error_response(format!("key check failed {}: {}", status.as_u16(), text));
    }

    Json(json!({ "ok": true })).into_response()
}

async fn handle_generate(
    State(state): State<RelayState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    // Any failure, a bad body included, comes back in the 500 {"error"}
    // shape rather than as a framework rejection.
    let raw = match payload {
        Ok(Json(raw)) => raw,
        Err(e) => return error_response(format!("malformed request body: {e}")),
    };
    let body: RelayRequest = match serde_json::from_value(raw) {
        Ok(body) => body,
        Err(e) => return error_response(format!("malformed request body: {e}")),
    };

    // The model name lands in the upstream URL path; keep it to the
    // characters real model ids use.
    if !body
        .model
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        || body.model.is_empty()
    {
        return error_response(format!("invalid model identifier '{}'", body.model));
    }

    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        state.upstream_base, body.model,
    );

    let upstream_body = json!({
        "contents": body.contents,
        "generationConfig": body.config,
    });

    tracing::info!(model = %body.model, "relaying generation request");

    let result = state
        .client
        .post(&url)
        .header("x-goog-api-key", &state.api_key)
        .header(header::CONTENT_TYPE, "application/json")
        .json(&upstream_body)
        .send()
        .await;

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "upstream call failed");
            return error_response(e.to_string());
        }
    };

    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => return error_response(e.to_string()),
    };

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "upstream returned an error");
        return error_response(format!("upstream error {}: {}", status.as_u16(), text));
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        text,
    )
        .into_response()
}

fn error_response(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}
