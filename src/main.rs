// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use sentence_embed_service::{
    api::{start_server, AppState},
    cli::Cli,
    embeddings::{OnnxEmbeddingModel, TextEmbedder},
    version,
};
use std::{env, sync::Arc};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("Starting {}", version::get_version_string());

    let config = Cli::parse().into_config();
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;
    let addr = config.bind_addr().map_err(|e| anyhow!(e))?;

    // Model load happens before the listener binds; any failure here exits
    let source = config.model_source.clone();
    let intra_threads = config.intra_threads;
    let model = tokio::task::spawn_blocking(move || {
        let files = source.resolve()?;
        info!(
            "Model files: {} / {}",
            files.model.display(),
            files.tokenizer.display()
        );
        OnnxEmbeddingModel::load(source.model_name(), &files, intra_threads)
    })
    .await
    .context("Model loading task panicked")?
    .context("Failed to initialize embedding model")?;

    info!(
        "Embedding model ready: {} ({} dimensions)",
        model.model_name(),
        model.dimension()
    );

    let embedder: Arc<dyn TextEmbedder> = Arc::new(model);
    let state = AppState::from_config(embedder, &config);

    info!("Missing \"text\" policy: {:?}", config.missing_text);
    info!(
        "Max concurrent inferences: {}",
        config.max_concurrent_inferences
    );
    match config.max_body_bytes {
        Some(limit) => info!("Max request body: {} bytes", limit),
        None => info!("Max request body: unlimited"),
    }
    info!("Endpoints: POST http://{}/embed, GET http://{}/health", addr, addr);

    start_server(addr, state).await
}
