//! `/api/management/branches`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};

use super::{ApiJson, ApiQuery, SharedState};
use crate::auth::{guard, ADMINS, ANY_ROLE};
use crate::error::ApiResult;
use crate::services::branches::BranchService;
use crate::services::ActionResult;
use zarmind_core::{Branch, BranchPatch, BranchQuery, NewBranch, PagedResult};

pub fn router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/", get(list).route_layer(guard!(state, ANY_ROLE)))
        .route("/", post(create).route_layer(guard!(state, ADMINS)))
        .route("/{id}", get(get_one).route_layer(guard!(state, ANY_ROLE)))
        .route("/{id}", patch(update).route_layer(guard!(state, ADMINS)))
        .route("/{id}", delete(remove).route_layer(guard!(state, ADMINS)))
        .route("/{id}/active", patch(toggle_active).route_layer(guard!(state, ADMINS)))
}

async fn list(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<BranchQuery>,
) -> ApiResult<Json<PagedResult<Branch>>> {
    Ok(Json(BranchService::new(&state.db).list(&query).await?))
}

async fn create(
    State(state): State<SharedState>,
    ApiJson(input): ApiJson<NewBranch>,
) -> ApiResult<(StatusCode, Json<Branch>)> {
    let created = BranchService::new(&state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_one(State(state): State<SharedState>, Path(id): Path<String>) -> ApiResult<Json<Branch>> {
    Ok(Json(BranchService::new(&state.db).get(&id).await?))
}

async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<BranchPatch>,
) -> ApiResult<Json<Branch>> {
    Ok(Json(BranchService::new(&state.db).update(&id, patch).await?))
}

async fn toggle_active(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Branch>> {
    Ok(Json(BranchService::new(&state.db).toggle_active(&id).await?))
}

async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionResult>> {
    let removal = BranchService::new(&state.db).remove(&id).await?;
    Ok(Json(ActionResult::removed("Branch", removal)))
}
