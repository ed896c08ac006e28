//! `/api/users`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};

use super::{ApiJson, ApiQuery, SharedState};
use crate::auth::{guard, ADMINS};
use crate::error::ApiResult;
use crate::services::users::UserService;
use crate::services::ActionResult;
use zarmind_core::{NewUser, PagedResult, User, UserPatch, UserQuery};

pub fn router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/", get(list).route_layer(guard!(state, ADMINS)))
        .route("/", post(create).route_layer(guard!(state, ADMINS)))
        .route("/{id}", get(get_one).route_layer(guard!(state, ADMINS)))
        .route("/{id}", patch(update).route_layer(guard!(state, ADMINS)))
        .route("/{id}", delete(remove).route_layer(guard!(state, ADMINS)))
}

async fn list(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<Json<PagedResult<User>>> {
    Ok(Json(UserService::new(&state.db).list(&query).await?))
}

async fn create(
    State(state): State<SharedState>,
    ApiJson(input): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let created = UserService::new(&state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_one(State(state): State<SharedState>, Path(id): Path<String>) -> ApiResult<Json<User>> {
    Ok(Json(UserService::new(&state.db).get(&id).await?))
}

async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> ApiResult<Json<User>> {
    Ok(Json(UserService::new(&state.db).update(&id, patch).await?))
}

async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionResult>> {
    UserService::new(&state.db).remove(&id).await?;
    Ok(Json(ActionResult::ok("User deactivated")))
}
