// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod version;

pub use api::{create_app, start_server, AppState};
pub use config::{MissingTextPolicy, ServiceConfig};
pub use embeddings::{
    EmbeddingError, HashingEmbedder, ModelSource, OnnxEmbeddingModel, TextEmbedder,
};
