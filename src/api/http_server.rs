// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::Semaphore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{embed_handler, health_handler, method_not_allowed_handler, not_found_handler};
use crate::config::{MissingTextPolicy, ServiceConfig};
use crate::embeddings::TextEmbedder;

/// Shared, read-only request state
#[derive(Clone)]
pub struct AppState {
    pub embedder: Arc<dyn TextEmbedder>,
    pub missing_text: MissingTextPolicy,
    /// Bounds how many `encode` calls occupy blocking threads at once
    pub inference_limiter: Arc<Semaphore>,
    /// Request body cap; `None` accepts bodies of any size
    pub max_body_bytes: Option<usize>,
}

impl AppState {
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        missing_text: MissingTextPolicy,
        max_concurrent_inferences: usize,
    ) -> Self {
        Self {
            embedder,
            missing_text,
            inference_limiter: Arc::new(Semaphore::new(max_concurrent_inferences.max(1))),
            max_body_bytes: None,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: Option<usize>) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn from_config(embedder: Arc<dyn TextEmbedder>, config: &ServiceConfig) -> Self {
        Self::new(
            embedder,
            config.missing_text,
            config.max_concurrent_inferences,
        )
        .with_max_body_bytes(config.max_body_bytes)
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = match state.max_body_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route(
            "/health",
            get(health_handler).fallback(method_not_allowed_handler),
        )
        .route(
            "/embed",
            post(embed_handler).fallback(method_not_allowed_handler),
        )
        .fallback(not_found_handler)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C / SIGTERM.
pub async fn start_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("API server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
