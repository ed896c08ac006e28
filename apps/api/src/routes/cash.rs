//! `/api/financials/cash`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Extension, Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;

use super::{ApiJson, ApiQuery, SharedState};
use crate::auth::{guard, AuthUser, ADMINS, CASHIERS, FINANCE};
use crate::error::ApiResult;
use crate::services::cash::{CashBalance, CashService, CashSummary};
use crate::services::ActionResult;
use zarmind_core::{
    CashTransaction, CashTransactionPatch, CashTransactionQuery, NewCashTransaction, PagedResult,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryQuery {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    branch_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceQuery {
    branch_id: Option<String>,
}

pub fn router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/", get(list).route_layer(guard!(state, CASHIERS)))
        .route("/", post(create).route_layer(guard!(state, CASHIERS)))
        .route("/summary", get(summary).route_layer(guard!(state, FINANCE)))
        .route("/balance", get(balance).route_layer(guard!(state, CASHIERS)))
        .route("/{id}", get(get_one).route_layer(guard!(state, CASHIERS)))
        .route("/{id}", patch(update).route_layer(guard!(state, FINANCE)))
        .route("/{id}", delete(remove).route_layer(guard!(state, ADMINS)))
}

async fn list(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<CashTransactionQuery>,
) -> ApiResult<Json<PagedResult<CashTransaction>>> {
    Ok(Json(CashService::new(&state.db).list(&query).await?))
}

async fn create(
    State(state): State<SharedState>,
    Extension(caller): Extension<AuthUser>,
    ApiJson(input): ApiJson<NewCashTransaction>,
) -> ApiResult<(StatusCode, Json<CashTransaction>)> {
    let created = CashService::new(&state.db).create(input, &caller.id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn summary(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> ApiResult<Json<CashSummary>> {
    let summary = CashService::new(&state.db)
        .summary(query.from, query.to, query.branch_id.as_deref())
        .await?;
    Ok(Json(summary))
}

async fn balance(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<BalanceQuery>,
) -> ApiResult<Json<CashBalance>> {
    let balance = CashService::new(&state.db)
        .balance(query.branch_id.as_deref())
        .await?;
    Ok(Json(balance))
}

async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CashTransaction>> {
    Ok(Json(CashService::new(&state.db).get(&id).await?))
}

async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<CashTransactionPatch>,
) -> ApiResult<Json<CashTransaction>> {
    Ok(Json(CashService::new(&state.db).update(&id, patch).await?))
}

async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionResult>> {
    CashService::new(&state.db).remove(&id).await?;
    Ok(Json(ActionResult::ok("Cash transaction deleted")))
}
