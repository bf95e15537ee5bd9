// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the embedding model host
//!
//! Load-time variants (missing files, download, tokenizer, shape) are fatal
//! at startup. `Runtime` and `DimensionMismatch` can also surface per request
//! and are reported to callers as internal errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or running an embedding model
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// A required model artifact is not present on disk
    #[error("{kind} file not found: {}", path.display())]
    ModelFileNotFound { kind: &'static str, path: PathBuf },

    /// Fetching the model from the Hugging Face Hub failed
    #[error("Failed to download {file} from {repo}: {source}")]
    Download {
        repo: String,
        file: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Tokenizer could not be loaded or failed to encode the input
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// ONNX Runtime session creation or inference failed
    #[error("ONNX runtime error: {0}")]
    Runtime(String),

    /// Tensor construction or model output had an unexpected shape
    #[error("Unexpected tensor shape: {0}")]
    Shape(String),

    /// Pooled vector width differs from the model's declared dimension
    #[error("Unexpected embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl From<ndarray::ShapeError> for EmbeddingError {
    fn from(err: ndarray::ShapeError) -> Self {
        EmbeddingError::Shape(err.to_string())
    }
}
