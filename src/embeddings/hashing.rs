// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Weight-free deterministic embedder
//!
//! Produces hash-seeded pseudo-random unit vectors. Same text, same vector;
//! different text, (almost certainly) different vector. Carries no semantic
//! meaning, so it is only useful for exercising the HTTP layer and pooling
//! contracts without downloading model weights.

use crate::embeddings::pooling::l2_normalize;
use crate::embeddings::{EmbeddingError, TextEmbedder};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    model_name: String,
    dimension: usize,
}

impl HashingEmbedder {
    /// # Panics
    /// Panics if `dimension` is zero.
    pub fn new(model_name: impl Into<String>, dimension: usize) -> Self {
        assert!(dimension > 0, "Embedding dimension must be greater than 0");
        Self {
            model_name: model_name.into(),
            dimension,
        }
    }
}

impl TextEmbedder for HashingEmbedder {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut current_seed = hasher.finish();

        let mut embedding = Vec::with_capacity(self.dimension);
        for i in 0..self.dimension {
            // LCG step, mixed with the component index
            current_seed =
                (current_seed.wrapping_mul(1664525).wrapping_add(1013904223)) ^ (i as u64);
            let value = (current_seed as f64 / u64::MAX as f64) * 2.0 - 1.0;
            embedding.push(value as f32);
        }

        l2_normalize(&mut embedding);
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
