//! `/api/workshops`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};

use super::{ApiJson, ApiQuery, SharedState};
use crate::auth::{guard, ADMINS, ANY_ROLE, MANAGERS};
use crate::error::ApiResult;
use crate::services::workshops::WorkshopService;
use crate::services::ActionResult;
use zarmind_core::{NewWorkshop, PagedResult, RatingUpdate, Workshop, WorkshopPatch, WorkshopQuery};

pub fn router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/", get(list).route_layer(guard!(state, ANY_ROLE)))
        .route("/", post(create).route_layer(guard!(state, MANAGERS)))
        .route("/{id}", get(get_one).route_layer(guard!(state, ANY_ROLE)))
        .route("/{id}", patch(update).route_layer(guard!(state, MANAGERS)))
        .route("/{id}", delete(remove).route_layer(guard!(state, ADMINS)))
        .route("/{id}/rating", patch(rate).route_layer(guard!(state, MANAGERS)))
        .nest("/work-orders", super::work_orders::router(state))
}

async fn list(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<WorkshopQuery>,
) -> ApiResult<Json<PagedResult<Workshop>>> {
    Ok(Json(WorkshopService::new(&state.db).list(&query).await?))
}

async fn create(
    State(state): State<SharedState>,
    ApiJson(input): ApiJson<NewWorkshop>,
) -> ApiResult<(StatusCode, Json<Workshop>)> {
    let created = WorkshopService::new(&state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Workshop>> {
    Ok(Json(WorkshopService::new(&state.db).get(&id).await?))
}

async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<WorkshopPatch>,
) -> ApiResult<Json<Workshop>> {
    Ok(Json(WorkshopService::new(&state.db).update(&id, patch).await?))
}

async fn rate(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<RatingUpdate>,
) -> ApiResult<Json<Workshop>> {
    Ok(Json(WorkshopService::new(&state.db).rate(&id, input).await?))
}

async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionResult>> {
    let removal = WorkshopService::new(&state.db).remove(&id).await?;
    Ok(Json(ActionResult::removed("Workshop", removal)))
}
