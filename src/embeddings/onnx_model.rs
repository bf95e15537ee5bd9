// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! This module provides a wrapper around ONNX Runtime for running
//! sentence-transformer models exported to ONNX (all-MiniLM-L6-v2 by default).
//!
//! Features:
//! - ONNX model loading from disk (CPU execution provider)
//! - BERT tokenization with truncation to the model's max sequence length
//! - Mean pooling over token embeddings, weighted by the attention mask
//! - L2 normalization of the pooled sentence vector
//! - Output width discovered from a validation inference at load time

use crate::embeddings::pooling::{l2_normalize, mean_pool};
use crate::embeddings::{EmbeddingError, ModelFiles, TextEmbedder};
use ndarray::{Array2, Axis, Ix2};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::sync::{Mutex, PoisonError};
use tokenizers::{Encoding, Tokenizer, TruncationParams};
use tracing::{debug, info};

/// Maximum sequence length used by sentence-transformers for all-MiniLM-L6-v2
pub const DEFAULT_MAX_LENGTH: usize = 256;

/// ONNX-based sentence embedding model
///
/// Loaded once at startup and shared read-only across requests. The model
/// uses a sentence transformer architecture with:
/// - BERT-based tokenizer
/// - Mean pooling over token embeddings
/// - L2 normalization
///
/// # Thread Safety
/// `Session::run` needs exclusive access, so the session sits behind a
/// `Mutex` and concurrent `encode` calls are serialized at the inference step.
/// Tokenization runs outside the lock.
pub struct OnnxEmbeddingModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model_name: String,
    dimension: usize,
    max_length: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

fn runtime_error(err: impl std::fmt::Display) -> EmbeddingError {
    EmbeddingError::Runtime(err.to_string())
}

impl OnnxEmbeddingModel {
    /// Loads the ONNX graph and tokenizer and runs one validation inference.
    ///
    /// Blocking. Intended to be called once during startup.
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file is missing or invalid
    /// - ONNX Runtime initialization fails
    /// - The model does not produce `[batch, seq_len, hidden]` token embeddings
    ///
    /// # Example
    /// ```ignore
    /// let files = ModelSource::default().resolve()?;
    /// let model = OnnxEmbeddingModel::load("all-MiniLM-L6-v2", &files, 4)?;
    /// assert_eq!(model.dimension(), 384);
    /// ```
    pub fn load(
        model_name: impl Into<String>,
        files: &ModelFiles,
        intra_threads: usize,
    ) -> Result<Self, EmbeddingError> {
        let model_name = model_name.into();

        if !files.model.is_file() {
            return Err(EmbeddingError::ModelFileNotFound {
                kind: "ONNX model",
                path: files.model.clone(),
            });
        }
        if !files.tokenizer.is_file() {
            return Err(EmbeddingError::ModelFileNotFound {
                kind: "Tokenizer",
                path: files.tokenizer.clone(),
            });
        }

        info!(
            "Initializing ONNX embedding model {} from {}",
            model_name,
            files.model.display()
        );

        let mut session = Session::builder()
            .map_err(runtime_error)?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .map_err(runtime_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(runtime_error)?
            .with_intra_threads(intra_threads)
            .map_err(runtime_error)?
            .commit_from_file(&files.model)
            .map_err(runtime_error)?;

        let mut tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| EmbeddingError::Tokenizer(format!("failed to load: {}", e)))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: DEFAULT_MAX_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;
        tokenizer.with_padding(None);

        // Output width comes from a probe inference
        let probe = tokenizer
            .encode("validation test", true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;
        let dimension = forward(&mut session, &probe)?.len();
        if dimension == 0 {
            return Err(EmbeddingError::Shape(
                "model produced zero-width token embeddings".to_string(),
            ));
        }

        info!(
            "ONNX embedding model {} loaded ({} dimensions)",
            model_name, dimension
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            model_name,
            dimension,
            max_length: DEFAULT_MAX_LENGTH,
        })
    }

    /// Maximum number of tokens fed to the model; longer input is truncated
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl TextEmbedder for OnnxEmbeddingModel {
    /// Generates a unit-length embedding for a single text.
    ///
    /// 1. Tokenize (special tokens added, truncated to `max_length`)
    /// 2. Run ONNX inference
    /// 3. Mean pooling weighted by the attention mask
    /// 4. L2 normalization
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        debug!("Encoding {} tokens", encoding.get_ids().len());

        let mut embedding = {
            // A panic in an earlier run leaves the session usable
            let mut session = self
                .session
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            forward(&mut session, &encoding)?
        };

        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
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

/// Runs one tokenized sequence through the model and mean-pools the output.
fn forward(session: &mut Session, encoding: &Encoding) -> Result<Vec<f32>, EmbeddingError> {
    let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
    let attention_mask: Vec<i64> = encoding
        .get_attention_mask()
        .iter()
        .map(|&m| m as i64)
        .collect();
    let seq_len = input_ids.len();
    let token_type_ids: Vec<i64> = vec![0i64; seq_len];

    let input_ids_array = Array2::from_shape_vec((1, seq_len), input_ids)?;
    let attention_mask_array = Array2::from_shape_vec((1, seq_len), attention_mask.clone())?;
    let token_type_ids_array = Array2::from_shape_vec((1, seq_len), token_type_ids)?;

    let outputs = session
        .run(ort::inputs![
            "input_ids" => Value::from_array(input_ids_array).map_err(runtime_error)?,
            "attention_mask" => Value::from_array(attention_mask_array).map_err(runtime_error)?,
            "token_type_ids" => Value::from_array(token_type_ids_array).map_err(runtime_error)?
        ])
        .map_err(runtime_error)?;

    // Index [0]: exported models differ in output names
    let output = outputs[0]
        .try_extract_array::<f32>()
        .map_err(runtime_error)?;

    // Token-level embeddings: [batch, seq_len, hidden_dim]
    if output.ndim() != 3 {
        return Err(EmbeddingError::Shape(format!(
            "expected [batch, seq_len, hidden] output, got {:?}",
            output.shape()
        )));
    }

    let tokens = output
        .index_axis(Axis(0), 0)
        .into_dimensionality::<Ix2>()?;

    Ok(mean_pool(tokens, &attention_mask))
}
