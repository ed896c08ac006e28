//! `/api/analytics/dashboard`, `/api/reports/ap-aging` and `/api/reports/ar-aging`.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use super::{ApiQuery, SharedState};
use crate::auth::{guard, ANY_ROLE, FINANCE};
use crate::error::ApiResult;
use crate::services::analytics::{AgingQuery, AgingReport, AnalyticsService, Dashboard, DashboardQuery};
use zarmind_core::LedgerKind;

pub fn router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/analytics/dashboard", get(dashboard).route_layer(guard!(state, ANY_ROLE)))
        .route("/reports/ap-aging", get(ap_aging).route_layer(guard!(state, FINANCE)))
        .route("/reports/ar-aging", get(ar_aging).route_layer(guard!(state, FINANCE)))
}

fn analytics(state: &SharedState) -> AnalyticsService {
    AnalyticsService::new(&state.db, &state.cache, state.config.dashboard_cache_ttl_secs)
}

async fn dashboard(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> ApiResult<Json<Dashboard>> {
    Ok(Json(analytics(&state).dashboard(&query).await?))
}

async fn ap_aging(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<AgingQuery>,
) -> ApiResult<Json<AgingReport>> {
    Ok(Json(analytics(&state).aging(LedgerKind::Payable, &query).await?))
}

async fn ar_aging(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<AgingQuery>,
) -> ApiResult<Json<AgingReport>> {
    Ok(Json(analytics(&state).aging(LedgerKind::Receivable, &query).await?))
}
