// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX embedding model tests against real all-MiniLM-L6-v2 weights
//!
//! Ignored by default. Point `EMBED_TEST_MODEL_DIR` at a directory holding
//! `model.onnx` (or `onnx/model.onnx`) and `tokenizer.json`, then run with
//! `--ignored`. Reference values assume the pinned default revision.

use sentence_embed_service::embeddings::{ModelSource, OnnxEmbeddingModel, TextEmbedder};
use std::path::PathBuf;
use std::sync::Arc;

fn load_model() -> OnnxEmbeddingModel {
    let dir = std::env::var("EMBED_TEST_MODEL_DIR")
        .map(PathBuf::from)
        .expect("EMBED_TEST_MODEL_DIR must point at an all-MiniLM-L6-v2 export");
    let source = ModelSource::Local { dir };
    let files = source.resolve().expect("model files present");
    OnnxEmbeddingModel::load(source.model_name(), &files, 2).expect("model loads")
}

/// sentence-transformers `encode("hello world")` for all-MiniLM-L6-v2
/// (normalized), first five components
const HELLO_WORLD_HEAD: [f32; 5] = [
    -0.034_477_3,
    0.031_023_2,
    0.006_734_9,
    0.026_108_9,
    -0.039_362_0,
];

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[cfg(test)]
mod onnx_model_tests {
    use super::*;

    #[test]
    #[ignore]
    fn test_dimension_is_384() {
        let model = load_model();
        assert_eq!(model.dimension(), 384);
        assert_eq!(model.encode("hello world").unwrap().len(), 384);
    }

    #[test]
    #[ignore]
    fn test_golden_vector_hello_world() {
        let model = load_model();
        let v = model.encode("hello world").unwrap();

        for (i, (got, want)) in v.iter().zip(HELLO_WORLD_HEAD).enumerate() {
            assert!(
                (got - want).abs() < 1e-4,
                "component {}: got {}, want {}",
                i,
                got,
                want
            );
        }
    }

    #[test]
    #[ignore]
    fn test_encode_is_deterministic() {
        let model = load_model();
        let a = model.encode("The quick brown fox").unwrap();
        let b = model.encode("The quick brown fox").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    #[ignore]
    fn test_output_is_unit_length() {
        let model = load_model();
        for text in ["short", "a somewhat longer sentence about embeddings"] {
            let v = model.encode(text).unwrap();
            assert!((norm(&v) - 1.0).abs() < 1e-4, "norm for {:?}", text);
            assert!(v.iter().all(|x| x.is_finite()));
        }
    }

    #[test]
    #[ignore]
    fn test_empty_text_still_embeds() {
        let model = load_model();
        let v = model.encode("").unwrap();
        assert_eq!(v.len(), 384);
        assert!(v.iter().all(|x| x.is_finite()));
    }

    #[test]
    #[ignore]
    fn test_semantic_similarity_ordering() {
        let model = load_model();
        let cat = model.encode("A cat sits on the mat").unwrap();
        let kitten = model.encode("A kitten is resting on a rug").unwrap();
        let finance = model.encode("Quarterly earnings beat analyst expectations").unwrap();

        assert!(cosine(&cat, &kitten) > cosine(&cat, &finance));
    }

    #[test]
    #[ignore]
    fn test_long_text_is_truncated_not_rejected() {
        let model = load_model();
        let long = "embedding ".repeat(5_000);
        let v = model.encode(&long).unwrap();
        assert_eq!(v.len(), 384);
        assert_eq!(model.max_length(), 256);
    }

    #[test]
    #[ignore]
    fn test_concurrent_encodes_match_sequential() {
        let model = Arc::new(load_model());
        let texts: Vec<String> = (0..8).map(|i| format!("sentence number {}", i)).collect();
        let expected: Vec<Vec<f32>> = texts.iter().map(|t| model.encode(t).unwrap()).collect();

        let handles: Vec<_> = texts
            .iter()
            .cloned()
            .map(|text| {
                let model = model.clone();
                std::thread::spawn(move || model.encode(&text).unwrap())
            })
            .collect();

        for (handle, want) in handles.into_iter().zip(expected) {
            assert_eq!(handle.join().unwrap(), want);
        }
    }
}
