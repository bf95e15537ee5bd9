// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding model host
//!
//! The HTTP layer only sees [`TextEmbedder`]. Production uses
//! [`OnnxEmbeddingModel`]; [`HashingEmbedder`] stands in when no weights are
//! available.

pub mod error;
pub mod hashing;
pub mod model_source;
pub mod onnx_model;
pub mod pooling;

pub use error::EmbeddingError;
pub use hashing::HashingEmbedder;
pub use model_source::{ModelFiles, ModelSource, DEFAULT_MODEL_REPO, DEFAULT_MODEL_REVISION};
pub use onnx_model::OnnxEmbeddingModel;

/// A loaded sentence embedding model.
///
/// Implementations are immutable after construction and must be safe to call
/// from several threads at once. `encode` is CPU-bound and blocking; async
/// callers should run it on a blocking thread.
pub trait TextEmbedder: Send + Sync {
    /// Embeds `text` into a vector of exactly [`dimension`](Self::dimension) floats.
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Output vector width
    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}
