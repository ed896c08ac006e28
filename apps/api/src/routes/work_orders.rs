//! `/api/workshops/work-orders`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};

use super::{ApiJson, ApiQuery, SharedState};
use crate::auth::{guard, ANY_ROLE, MANAGERS, WAREHOUSE};
use crate::error::ApiResult;
use crate::services::work_orders::WorkOrderService;
use crate::services::ActionResult;
use zarmind_core::{
    ImageChanges, NewWorkOrder, PagedResult, QualityUpdate, StatusUpdate, TransferWorkOrder,
    WorkOrder, WorkOrderPatch, WorkOrderQuery,
};

pub fn router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/", get(list).route_layer(guard!(state, ANY_ROLE)))
        .route("/", post(create).route_layer(guard!(state, MANAGERS)))
        .route("/{id}", get(get_one).route_layer(guard!(state, ANY_ROLE)))
        .route("/{id}", patch(update).route_layer(guard!(state, MANAGERS)))
        .route("/{id}", delete(remove).route_layer(guard!(state, MANAGERS)))
        .route("/{id}/status", patch(update_status).route_layer(guard!(state, WAREHOUSE)))
        .route("/{id}/transfer", patch(transfer).route_layer(guard!(state, MANAGERS)))
        .route("/{id}/images", patch(update_images).route_layer(guard!(state, WAREHOUSE)))
        .route("/{id}/quality", patch(update_quality).route_layer(guard!(state, MANAGERS)))
}

async fn list(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<WorkOrderQuery>,
) -> ApiResult<Json<PagedResult<WorkOrder>>> {
    Ok(Json(WorkOrderService::new(&state.db).list(&query).await?))
}

async fn create(
    State(state): State<SharedState>,
    ApiJson(input): ApiJson<NewWorkOrder>,
) -> ApiResult<(StatusCode, Json<WorkOrder>)> {
    let created = WorkOrderService::new(&state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<WorkOrder>> {
    Ok(Json(WorkOrderService::new(&state.db).get(&id).await?))
}

async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<WorkOrderPatch>,
) -> ApiResult<Json<WorkOrder>> {
    Ok(Json(WorkOrderService::new(&state.db).update(&id, patch).await?))
}

async fn update_status(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<StatusUpdate>,
) -> ApiResult<Json<WorkOrder>> {
    let order = WorkOrderService::new(&state.db)
        .update_status(&id, input)
        .await?;
    Ok(Json(order))
}

async fn transfer(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<TransferWorkOrder>,
) -> ApiResult<Json<WorkOrder>> {
    Ok(Json(WorkOrderService::new(&state.db).transfer(&id, input).await?))
}

async fn update_images(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ImageChanges>,
) -> ApiResult<Json<WorkOrder>> {
    let order = WorkOrderService::new(&state.db)
        .update_images(&id, input)
        .await?;
    Ok(Json(order))
}

async fn update_quality(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<QualityUpdate>,
) -> ApiResult<Json<WorkOrder>> {
    let order = WorkOrderService::new(&state.db)
        .update_quality(&id, input)
        .await?;
    Ok(Json(order))
}

async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionResult>> {
    let removal = WorkOrderService::new(&state.db).remove(&id).await?;
    Ok(Json(ActionResult::ok(removal.message())))
}
