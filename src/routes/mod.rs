// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Router assembly: resource routes, liveness endpoint, CORS and request
//! tracing.

pub mod athletes;
pub mod completed;
pub mod extract;
pub mod planned;
pub mod timeline;

use crate::AppState;
use axum::extract::State;
use axum::http::{header, request::Parts, HeaderValue, Method};
use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Liveness report. `store` names the backend this instance writes to.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Health {
    pub status: &'static str,
    pub build_id: &'static str,
    pub store: &'static str,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        build_id: option_env!("BUILD_ID").unwrap_or("unknown"),
        store: state.config.store.as_str(),
    })
}

/// Browsers may call the API from the configured frontend or a local dev
/// server on any port.
fn allowed_origin(origin: &str, frontend_url: &str) -> bool {
    const DEV_ORIGINS: [&str; 2] = ["http://localhost", "http://127.0.0.1"];

    origin == frontend_url
        || DEV_ORIGINS.iter().any(|dev| {
            origin
                .strip_prefix(dev)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(':'))
        })
}

fn cors(frontend_url: String) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _: &Parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| allowed_origin(origin, &frontend_url))
            },
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health))
        .merge(timeline::routes())
        .merge(athletes::routes())
        .merge(planned::routes())
        .merge(completed::routes())
        .layer(cors(state.config.frontend_url.clone()))
        .layer(trace)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRONTEND: &str = "https://train.example.com";

    #[test]
    fn test_frontend_and_dev_origins_allowed() {
        assert!(allowed_origin(FRONTEND, FRONTEND));
        assert!(allowed_origin("http://localhost", FRONTEND));
        assert!(allowed_origin("http://localhost:5173", FRONTEND));
        assert!(allowed_origin("http://127.0.0.1:8080", FRONTEND));
    }

    #[test]
    fn test_lookalike_origins_rejected() {
        assert!(!allowed_origin("https://train.example.com.evil.net", FRONTEND));
        assert!(!allowed_origin("http://localhost.evil.net", FRONTEND));
        assert!(!allowed_origin("http://127.0.0.1.nip.io", FRONTEND));
        assert!(!allowed_origin("https://localhost:5173", FRONTEND));
    }
}
