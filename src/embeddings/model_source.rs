// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Model artifact resolution
//!
//! Turns a configured [`ModelSource`] into concrete file paths for the ONNX
//! graph and its tokenizer. Hub sources are fetched once into the local
//! Hugging Face cache; later starts reuse the cached files.

use crate::embeddings::EmbeddingError;
use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use std::path::{Path, PathBuf};
use tracing::info;

/// Default sentence-transformers model served by this crate
pub const DEFAULT_MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Hub commit the golden vectors were taken from; `--model-revision` overrides
pub const DEFAULT_MODEL_REVISION: &str = "c9745ed1d9f207416be6d2e6f8de32d1f16199bf";

/// ONNX export path inside a sentence-transformers Hub repository
const HUB_MODEL_FILE: &str = "onnx/model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Where the embedding model comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// A local directory holding `model.onnx` (or `onnx/model.onnx`) and `tokenizer.json`
    Local { dir: PathBuf },
    /// A Hugging Face Hub model repository
    Hub {
        repo: String,
        revision: String,
        cache_dir: Option<PathBuf>,
    },
}

/// Resolved on-disk model artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub model: PathBuf,
    pub tokenizer: PathBuf,
}

impl Default for ModelSource {
    fn default() -> Self {
        ModelSource::Hub {
            repo: DEFAULT_MODEL_REPO.to_string(),
            revision: DEFAULT_MODEL_REVISION.to_string(),
            cache_dir: None,
        }
    }
}

impl ModelSource {
    /// Short model name used in logs (last path segment of the repo or directory)
    pub fn model_name(&self) -> String {
        match self {
            ModelSource::Local { dir } => dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| dir.display().to_string()),
            ModelSource::Hub { repo, .. } => repo
                .rsplit('/')
                .next()
                .unwrap_or(repo.as_str())
                .to_string(),
        }
    }

    /// Resolves the source to local files, downloading from the Hub if needed.
    ///
    /// Blocking: performs file system checks and, for Hub sources, network I/O.
    pub fn resolve(&self) -> Result<ModelFiles, EmbeddingError> {
        match self {
            ModelSource::Local { dir } => resolve_local(dir),
            ModelSource::Hub {
                repo,
                revision,
                cache_dir,
            } => resolve_hub(repo, revision, cache_dir.as_deref()),
        }
    }
}

fn resolve_local(dir: &Path) -> Result<ModelFiles, EmbeddingError> {
    let flat = dir.join("model.onnx");
    let nested = dir.join(HUB_MODEL_FILE);
    let model = if flat.is_file() {
        flat
    } else if nested.is_file() {
        nested
    } else {
        return Err(EmbeddingError::ModelFileNotFound {
            kind: "ONNX model",
            path: flat,
        });
    };

    let tokenizer = dir.join(TOKENIZER_FILE);
    if !tokenizer.is_file() {
        return Err(EmbeddingError::ModelFileNotFound {
            kind: "Tokenizer",
            path: tokenizer,
        });
    }

    Ok(ModelFiles { model, tokenizer })
}

fn resolve_hub(
    repo_id: &str,
    revision: &str,
    cache_dir: Option<&Path>,
) -> Result<ModelFiles, EmbeddingError> {
    let download_error = |file: &str, source: Box<dyn std::error::Error + Send + Sync>| {
        EmbeddingError::Download {
            repo: repo_id.to_string(),
            file: file.to_string(),
            source,
        }
    };

    let mut builder = ApiBuilder::new().with_progress(false);
    if let Some(dir) = cache_dir {
        builder = builder.with_cache_dir(dir.to_path_buf());
    }
    let api = builder
        .build()
        .map_err(|e| download_error("<api>", e.to_string().into()))?;

    let repo = api.repo(Repo::with_revision(
        repo_id.to_string(),
        RepoType::Model,
        revision.to_string(),
    ));

    info!("Fetching {}@{} from Hugging Face Hub", repo_id, revision);
    let model = repo
        .get(HUB_MODEL_FILE)
        .map_err(|e| download_error(HUB_MODEL_FILE, e.to_string().into()))?;
    let tokenizer = repo
        .get(TOKENIZER_FILE)
        .map_err(|e| download_error(TOKENIZER_FILE, e.to_string().into()))?;

    Ok(ModelFiles { model, tokenizer })
}
