// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::config::{
    default_concurrency, MissingTextPolicy, ServiceConfig, DEFAULT_HOST, DEFAULT_INTRA_THREADS,
    DEFAULT_PORT,
};
use clap::Parser;
use std::path::PathBuf;

/// Sentence embedding HTTP service
#[derive(Parser, Debug)]
#[command(name = "sentence-embed-service")]
#[command(version)]
#[command(about = "Serves POST /embed and GET /health over a sentence-transformer model", long_about = None)]
pub struct Cli {
    /// Address to listen on: an IP literal or a resolvable hostname
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Hugging Face Hub repository of the model (ignored when --model-dir is set)
    #[arg(long, env = "MODEL_REPO")]
    pub model_repo: Option<String>,

    /// Hub revision (branch, tag or commit)
    #[arg(long, env = "MODEL_REVISION")]
    pub model_revision: Option<String>,

    /// Local directory with model.onnx and tokenizer.json; skips the Hub
    #[arg(long, env = "MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Download cache for Hub models (defaults to the Hugging Face cache)
    #[arg(long, env = "MODEL_CACHE_DIR")]
    pub model_cache_dir: Option<PathBuf>,

    /// What to do when a request omits "text"
    #[arg(long = "missing-text", env = "MISSING_TEXT_POLICY", value_enum, default_value_t = MissingTextPolicy::Empty)]
    pub missing_text: MissingTextPolicy,

    /// Maximum number of inferences running at once
    #[arg(long, env = "MAX_CONCURRENT_INFERENCES", default_value_t = default_concurrency())]
    pub max_concurrent_inferences: usize,

    /// Maximum POST /embed body size in bytes; unlimited when unset
    #[arg(long, env = "MAX_BODY_BYTES")]
    pub max_body_bytes: Option<usize>,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "ONNX_INTRA_THREADS", default_value_t = DEFAULT_INTRA_THREADS)]
    pub intra_threads: usize,
}

impl Cli {
    pub fn into_config(self) -> ServiceConfig {
        ServiceConfig {
            host: self.host,
            port: self.port,
            model_source: ServiceConfig::model_source_from(
                self.model_dir,
                self.model_repo,
                self.model_revision,
                self.model_cache_dir,
            ),
            missing_text: self.missing_text,
            max_concurrent_inferences: self.max_concurrent_inferences,
            intra_threads: self.intra_threads,
            max_body_bytes: self.max_body_bytes,
        }
    }
}
