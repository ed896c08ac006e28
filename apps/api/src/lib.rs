//! # Zarmind API
//!
//! HTTP server for the jewelry ERP: branches, people, inventory, purchasing,
//! payables/receivables, settings and reports.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          API Server                                     │
//! │                                                                         │
//! │  client ──► axum (/api) ──► route guard ──► services ──► zarmind-db   │
//! │                                                │                        │
//! │                                                ▼                        │
//! │                                      Redis (optional cache)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `main.rs` wires configuration, database and cache into [`AppState`] and
//! serves [`build_router`].

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;

use crate::auth::JwtManager;
use crate::cache::Cache;
use crate::config::ApiConfig;
use zarmind_db::Database;

pub use services::auth::bootstrap_admin;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub cache: Cache,
    pub jwt: JwtManager,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(db: Database, cache: Cache, config: ApiConfig) -> Self {
        AppState {
            db,
            cache,
            jwt: JwtManager::from_config(&config),
            config,
        }
    }
}

/// All routes under `/api`, with request tracing and CORS.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);
    Router::new()
        .nest("/api", routes::api_router(&state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    if config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
