//! `/api/health`, open to everyone.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use super::SharedState;
use crate::services::analytics::{AnalyticsService, HealthReport};

pub fn router() -> Router<SharedState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<SharedState>) -> Json<HealthReport> {
    let service =
        AnalyticsService::new(&state.db, &state.cache, state.config.dashboard_cache_ttl_secs);
    Json(service.health().await)
}
