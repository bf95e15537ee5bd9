// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed HTTP handler

use crate::api::embed::{EmbedRequest, EmbedResponse};
use crate::api::http_server::AppState;
use crate::api::ApiError;
use axum::{
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use tracing::{debug, error};

/// POST /embed handler
///
/// Parses `{"text": string}`, runs the model on the blocking pool and returns
/// `{"embedding": [float, ...]}`.
///
/// # Errors
/// - 400 `invalid_request`: body is not a JSON object with a string `text`
/// - 400 `validation_error`: `text` missing under the `reject` policy
/// - 413 `payload_too_large`: body exceeds the configured `max_body_bytes`
/// - 500 `internal_error`: inference failed; the model stays usable
pub async fn embed_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let body = body.map_err(body_rejection)?;
    let text = EmbedRequest::from_body(&body)?.into_text(state.missing_text)?;

    let permit = state
        .inference_limiter
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| ApiError::InternalError(format!("inference limiter closed: {}", e)))?;

    let embedder = state.embedder.clone();
    let char_count = text.chars().count();
    // Permit moves into the worker so it is held until inference finishes,
    // even if the client disconnects and this future is dropped
    let embedding = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        embedder.encode(&text)
    })
    .await
    .map_err(|e| {
        error!("Embedding worker failed: {}", e);
        ApiError::InternalError(format!("embedding worker failed: {}", e))
    })?
    .map_err(|e| {
        error!("Embedding generation failed: {}", e);
        ApiError::InternalError(e.to_string())
    })?;

    debug!(
        "Embedded {} chars into {} dimensions",
        char_count,
        embedding.len()
    );

    Ok(Json(EmbedResponse::from(embedding)))
}

/// Keeps body extraction failures in the JSON error shape
fn body_rejection(rejection: BytesRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(rejection.body_text())
    } else {
        ApiError::InvalidRequest(rejection.body_text())
    }
}
