// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Concurrent request handling

use crate::common::*;
use axum::http::StatusCode;
use futures_util::future::join_all;
use sentence_embed_service::{embeddings::HashingEmbedder, MissingTextPolicy, TextEmbedder};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_have_no_cross_talk() {
    let app = hashing_app(MissingTextPolicy::Empty);
    let reference = HashingEmbedder::new("hashing-test", TEST_DIMENSION);

    let texts: Vec<String> = (0..32).map(|i| format!("concurrent text {}", i)).collect();

    let tasks = texts.iter().cloned().map(|text| {
        let app = app.clone();
        tokio::spawn(async move {
            let body = serde_json::json!({ "text": text }).to_string();
            let (status, json) = send(&app, post_embed(body)).await;
            (text, status, json)
        })
    });

    let results = join_all(tasks).await;
    assert_eq!(results.len(), texts.len());

    for result in results {
        let (text, status, body) = result.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            embedding_of(&body),
            reference.encode(&text).unwrap(),
            "response for {:?} does not match its own input",
            text
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_inference_concurrency_is_bounded() {
    let embedder = Arc::new(SlowCountingEmbedder::new(Duration::from_millis(30)));
    let app = app_with(embedder.clone(), MissingTextPolicy::Empty, 2);

    let tasks = (0..8).map(|i| {
        let app = app.clone();
        tokio::spawn(async move {
            let body = format!(r#"{{"text": "slow {}"}}"#, i);
            send(&app, post_embed(body)).await.0
        })
    });

    for status in join_all(tasks).await {
        assert_eq!(status.unwrap(), StatusCode::OK);
    }

    let peak = embedder.peak.load(Ordering::SeqCst);
    assert!(peak >= 1);
    assert!(peak <= 2, "peak concurrency {} exceeded limit", peak);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_health_answers_while_inference_is_busy() {
    let embedder = Arc::new(SlowCountingEmbedder::new(Duration::from_millis(300)));
    let app = app_with(embedder, MissingTextPolicy::Empty, 1);

    let busy = {
        let app = app.clone();
        tokio::spawn(async move { send(&app, post_embed(r#"{"text": "slow"}"#)).await.0 })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    let (status, _) = tokio::time::timeout(Duration::from_millis(200), send(&app, get_health()))
        .await
        .expect("health check stalled behind inference");
    assert_eq!(status, StatusCode::OK);

    assert_eq!(busy.await.unwrap(), StatusCode::OK);
}
