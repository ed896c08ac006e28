//! `/api/inventory/products`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{ApiJson, ApiQuery, SharedState};
use crate::auth::{guard, ANY_ROLE, MANAGERS, WAREHOUSE};
use crate::error::ApiResult;
use crate::services::products::{AdjustmentResult, InventorySummary, ProductDetail, ProductService};
use crate::services::ActionResult;
use zarmind_core::{
    NewProduct, PagedResult, Product, ProductPatch, ProductQuery, QuantityAdjustment,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryQuery {
    branch_id: Option<String>,
}

pub fn router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/", get(list).route_layer(guard!(state, ANY_ROLE)))
        .route("/", post(create).route_layer(guard!(state, WAREHOUSE)))
        .route("/summary", get(summary).route_layer(guard!(state, ANY_ROLE)))
        .route("/qr/{qr_code}", get(by_qr).route_layer(guard!(state, ANY_ROLE)))
        .route("/{id}", get(get_one).route_layer(guard!(state, ANY_ROLE)))
        .route("/{id}", patch(update).route_layer(guard!(state, WAREHOUSE)))
        .route("/{id}", delete(remove).route_layer(guard!(state, MANAGERS)))
        .route("/{id}/adjust", post(adjust).route_layer(guard!(state, WAREHOUSE)))
}

async fn list(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> ApiResult<Json<PagedResult<Product>>> {
    Ok(Json(ProductService::new(&state.db).list(&query).await?))
}

async fn create(
    State(state): State<SharedState>,
    ApiJson(input): ApiJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<ProductDetail>)> {
    let created = ProductService::new(&state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn summary(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> ApiResult<Json<InventorySummary>> {
    let summary = ProductService::new(&state.db)
        .summary(query.branch_id.as_deref())
        .await?;
    Ok(Json(summary))
}

async fn by_qr(
    State(state): State<SharedState>,
    Path(qr_code): Path<String>,
) -> ApiResult<Json<ProductDetail>> {
    Ok(Json(ProductService::new(&state.db).by_qr(&qr_code).await?))
}

async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductDetail>> {
    Ok(Json(ProductService::new(&state.db).get(&id).await?))
}

async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> ApiResult<Json<Product>> {
    Ok(Json(ProductService::new(&state.db).update(&id, patch).await?))
}

async fn adjust(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<QuantityAdjustment>,
) -> ApiResult<Json<AdjustmentResult>> {
    Ok(Json(ProductService::new(&state.db).adjust(&id, input).await?))
}

async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionResult>> {
    let removal = ProductService::new(&state.db).remove(&id).await?;
    Ok(Json(ActionResult::removed("Product", removal)))
}
