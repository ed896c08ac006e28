//! `/api/financials/accounts-payable` and `/api/financials/accounts-receivable`.
//!
//! Both mount the same handlers; the [`LedgerKind`] rides along as a request
//! extension.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;

use super::{ApiJson, ApiQuery, SharedState};
use crate::auth::{guard, ADMINS, FINANCE};
use crate::error::ApiResult;
use crate::services::ledger::{LedgerService, LedgerSummary, PaymentResult};
use crate::services::ActionResult;
use zarmind_core::{
    LedgerEntry, LedgerKind, LedgerPatch, LedgerQuery, NewLedgerEntry, PagedResult, PaymentInput,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryQuery {
    #[serde(alias = "supplierId", alias = "customerId")]
    counterparty_id: Option<String>,
}

pub fn router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .nest("/accounts-payable", ledger_router(state, LedgerKind::Payable))
        .nest("/accounts-receivable", ledger_router(state, LedgerKind::Receivable))
        .nest("/expenses", super::expenses::router(state))
        .nest("/cash", super::cash::router(state))
}

fn ledger_router(state: &SharedState, kind: LedgerKind) -> Router<SharedState> {
    Router::new()
        .route("/", get(list).route_layer(guard!(state, FINANCE)))
        .route("/", post(create).route_layer(guard!(state, FINANCE)))
        .route("/summary", get(summary).route_layer(guard!(state, FINANCE)))
        .route("/{id}", get(get_one).route_layer(guard!(state, FINANCE)))
        .route("/{id}", patch(update).route_layer(guard!(state, FINANCE)))
        .route("/{id}", delete(remove).route_layer(guard!(state, ADMINS)))
        .route("/{id}/payment", post(record_payment).route_layer(guard!(state, FINANCE)))
        .layer(Extension(kind))
}

async fn list(
    State(state): State<SharedState>,
    Extension(kind): Extension<LedgerKind>,
    ApiQuery(query): ApiQuery<LedgerQuery>,
) -> ApiResult<Json<PagedResult<LedgerEntry>>> {
    Ok(Json(LedgerService::new(&state.db, kind).list(&query).await?))
}

async fn create(
    State(state): State<SharedState>,
    Extension(kind): Extension<LedgerKind>,
    ApiJson(input): ApiJson<NewLedgerEntry>,
) -> ApiResult<(StatusCode, Json<LedgerEntry>)> {
    let created = LedgerService::new(&state.db, kind).create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn summary(
    State(state): State<SharedState>,
    Extension(kind): Extension<LedgerKind>,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> ApiResult<Json<LedgerSummary>> {
    let summary = LedgerService::new(&state.db, kind)
        .summary(query.counterparty_id.as_deref())
        .await?;
    Ok(Json(summary))
}

async fn get_one(
    State(state): State<SharedState>,
    Extension(kind): Extension<LedgerKind>,
    Path(id): Path<String>,
) -> ApiResult<Json<LedgerEntry>> {
    Ok(Json(LedgerService::new(&state.db, kind).get(&id).await?))
}

async fn update(
    State(state): State<SharedState>,
    Extension(kind): Extension<LedgerKind>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<LedgerPatch>,
) -> ApiResult<Json<LedgerEntry>> {
    Ok(Json(LedgerService::new(&state.db, kind).update(&id, patch).await?))
}

async fn record_payment(
    State(state): State<SharedState>,
    Extension(kind): Extension<LedgerKind>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<PaymentInput>,
) -> ApiResult<Json<PaymentResult>> {
    let result = LedgerService::new(&state.db, kind)
        .record_payment(&id, input)
        .await?;
    Ok(Json(result))
}

async fn remove(
    State(state): State<SharedState>,
    Extension(kind): Extension<LedgerKind>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionResult>> {
    LedgerService::new(&state.db, kind).remove(&id).await?;
    Ok(Json(ActionResult::ok(format!("{} deleted", kind.entity()))))
}
