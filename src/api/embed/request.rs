// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbedRequest type for POST /embed
//!
//! The body is parsed from raw bytes so that malformed JSON, non-object JSON
//! and mistyped fields all map to one 400 response shape.

use crate::api::ApiError;
use crate::config::MissingTextPolicy;
use serde::{Deserialize, Serialize};

/// Request body for POST /embed
///
/// # Example
/// ```json
/// { "text": "hello world" }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmbedRequest {
    /// Text to embed; `None` when the key is absent
    #[serde(default, deserialize_with = "deserialize_text")]
    pub text: Option<String>,
}

/// Present-but-`null` is rejected like any other non-string value;
/// only an absent key yields `None` (via `#[serde(default)]`).
fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    String::deserialize(deserializer).map(Some)
}

impl EmbedRequest {
    /// Parses a request body. Anything that is not a JSON object with an
    /// optional string `text` is an `InvalidRequest`.
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| ApiError::InvalidRequest(format!("body is not valid JSON: {}", e)))?;

        if !value.is_object() {
            return Err(ApiError::InvalidRequest(
                "body must be a JSON object".to_string(),
            ));
        }

        serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid request body: {}", e)))
    }

    /// Applies the missing-field policy and returns the text to embed
    pub fn into_text(self, policy: MissingTextPolicy) -> Result<String, ApiError> {
        match (self.text, policy) {
            (Some(text), _) => Ok(text),
            (None, MissingTextPolicy::Empty) => Ok(String::new()),
            (None, MissingTextPolicy::Reject) => Err(ApiError::ValidationError {
                field: "text".to_string(),
                message: "text is required".to_string(),
            }),
        }
    }
}
