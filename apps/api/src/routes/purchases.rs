//! `/api/transactions/purchases`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Extension, Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;

use super::{ApiJson, ApiQuery, SharedState};
use crate::auth::{guard, AuthUser, ADMINS, ANY_ROLE, MANAGERS, WAREHOUSE};
use crate::error::ApiResult;
use crate::services::purchases::{PurchaseDetail, PurchaseService, PurchaseSummary};
use crate::services::ActionResult;
use zarmind_core::{
    CancelPurchase, CompletePurchase, NewPurchase, PagedResult, Purchase, PurchasePatch,
    PurchaseQuery, ReceiveItems,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryQuery {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    branch_id: Option<String>,
}

pub fn router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/", get(list).route_layer(guard!(state, ANY_ROLE)))
        .route("/", post(create).route_layer(guard!(state, WAREHOUSE)))
        .route("/summary", get(summary).route_layer(guard!(state, ANY_ROLE)))
        .route("/{id}", get(get_one).route_layer(guard!(state, ANY_ROLE)))
        .route("/{id}", patch(update).route_layer(guard!(state, WAREHOUSE)))
        .route("/{id}", delete(remove).route_layer(guard!(state, ADMINS)))
        .route("/{id}/receive", post(receive).route_layer(guard!(state, WAREHOUSE)))
        .route("/{id}/complete", post(complete).route_layer(guard!(state, MANAGERS)))
        .route("/{id}/cancel", post(cancel).route_layer(guard!(state, MANAGERS)))
}

async fn list(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<PurchaseQuery>,
) -> ApiResult<Json<PagedResult<Purchase>>> {
    Ok(Json(PurchaseService::new(&state.db).list(&query).await?))
}

async fn create(
    State(state): State<SharedState>,
    Extension(caller): Extension<AuthUser>,
    ApiJson(input): ApiJson<NewPurchase>,
) -> ApiResult<(StatusCode, Json<PurchaseDetail>)> {
    let created = PurchaseService::new(&state.db).create(input, &caller).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn summary(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> ApiResult<Json<PurchaseSummary>> {
    let summary = PurchaseService::new(&state.db)
        .summary(query.from, query.to, query.branch_id.as_deref())
        .await?;
    Ok(Json(summary))
}

async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PurchaseDetail>> {
    Ok(Json(PurchaseService::new(&state.db).get(&id).await?))
}

async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<PurchasePatch>,
) -> ApiResult<Json<Purchase>> {
    Ok(Json(PurchaseService::new(&state.db).update(&id, patch).await?))
}

async fn receive(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ReceiveItems>,
) -> ApiResult<Json<PurchaseDetail>> {
    Ok(Json(PurchaseService::new(&state.db).receive(&id, input).await?))
}

async fn complete(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Option<Json<CompletePurchase>>,
) -> ApiResult<Json<PurchaseDetail>> {
    let input = body.map(|Json(input)| input).unwrap_or_default();
    Ok(Json(PurchaseService::new(&state.db).complete(&id, input).await?))
}

async fn cancel(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CancelPurchase>,
) -> ApiResult<Json<PurchaseDetail>> {
    Ok(Json(PurchaseService::new(&state.db).cancel(&id, input).await?))
}

async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionResult>> {
    PurchaseService::new(&state.db).remove(&id).await?;
    Ok(Json(ActionResult::ok("Purchase deleted")))
}
