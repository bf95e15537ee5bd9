// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Runtime configuration for the embedding service

use crate::embeddings::{ModelSource, DEFAULT_MODEL_REPO, DEFAULT_MODEL_REVISION};
use clap::ValueEnum;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_INTRA_THREADS: usize = 4;

/// How `POST /embed` treats a body without a `text` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MissingTextPolicy {
    /// Substitute an empty string and embed it
    #[default]
    Empty,
    /// Reject with 400 `validation_error`
    Reject,
}

/// Service configuration, usually built from [`crate::cli::Cli`]
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub model_source: ModelSource,
    pub missing_text: MissingTextPolicy,
    /// Upper bound on `encode` calls running at once
    pub max_concurrent_inferences: usize,
    /// ONNX Runtime intra-op thread count
    pub intra_threads: usize,
    /// `POST /embed` body cap in bytes; `None` disables the cap
    pub max_body_bytes: Option<usize>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_source: ModelSource::default(),
            missing_text: MissingTextPolicy::default(),
            max_concurrent_inferences: default_concurrency(),
            intra_threads: DEFAULT_INTRA_THREADS,
            max_body_bytes: None,
        }
    }
}

impl ServiceConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_inferences == 0 {
            return Err("max_concurrent_inferences must be greater than 0".to_string());
        }
        if self.intra_threads == 0 {
            return Err("intra_threads must be greater than 0".to_string());
        }
        if self.max_body_bytes == Some(0) {
            return Err("max_body_bytes must be greater than 0".to_string());
        }
        if let ModelSource::Hub { repo, revision, .. } = &self.model_source {
            if repo.trim().is_empty() {
                return Err("model repository id cannot be empty".to_string());
            }
            if revision.trim().is_empty() {
                return Err("model revision cannot be empty".to_string());
            }
        }
        self.bind_addr().map(|_| ())
    }

    /// Socket address the HTTP listener binds to.
    ///
    /// IP literals are used as-is; hostnames such as `localhost` are resolved
    /// and the first address wins.
    pub fn bind_addr(&self) -> Result<SocketAddr, String> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err("host cannot be empty".to_string());
        }
        // Bare IPv6 literals need brackets before a port can be appended
        let addr = if host.contains(':') && !host.starts_with('[') {
            format!("[{}]:{}", host, self.port)
        } else {
            format!("{}:{}", host, self.port)
        };
        if let Ok(parsed) = addr.parse() {
            return Ok(parsed);
        }

        addr.to_socket_addrs()
            .map_err(|e| format!("invalid listen address {}: {}", addr, e))?
            .next()
            .ok_or_else(|| format!("{} did not resolve to any address", addr))
    }

    /// Builds the model source from the optional local dir and Hub coordinates
    pub fn model_source_from(
        model_dir: Option<PathBuf>,
        repo: Option<String>,
        revision: Option<String>,
        cache_dir: Option<PathBuf>,
    ) -> ModelSource {
        match model_dir {
            Some(dir) => ModelSource::Local { dir },
            None => ModelSource::Hub {
                repo: repo.unwrap_or_else(|| DEFAULT_MODEL_REPO.to_string()),
                revision: revision.unwrap_or_else(|| DEFAULT_MODEL_REVISION.to_string()),
                cache_dir,
            },
        }
    }
}

/// One inference slot per available core, never fewer than one
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(1)
}
