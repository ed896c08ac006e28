//! `/api/settings`.
//!
//! Non-public settings are only listed for admins, whatever the query says.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;

use super::{ApiJson, ApiQuery, SharedState};
use crate::auth::{guard, AuthUser, ADMINS, ANY_ROLE};
use crate::error::ApiResult;
use crate::services::settings::{BulkResult, SettingService, SettingView};
use crate::services::ActionResult;
use zarmind_core::paging::is_truthy;
use zarmind_core::{BulkSettingEntry, NewSetting, SettingPatch, SettingQuery};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupedQuery {
    include_private: Option<String>,
}

pub fn router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/", get(list).route_layer(guard!(state, ANY_ROLE)))
        .route("/", post(create).route_layer(guard!(state, ADMINS)))
        .route("/public", get(public))
        .route("/grouped", get(grouped).route_layer(guard!(state, ANY_ROLE)))
        .route("/bulk", post(bulk).route_layer(guard!(state, ADMINS)))
        .route("/{key}", get(get_one).route_layer(guard!(state, ANY_ROLE)))
        .route("/{key}", patch(update).route_layer(guard!(state, ADMINS)))
        .route("/{key}", delete(remove).route_layer(guard!(state, ADMINS)))
}

async fn list(
    State(state): State<SharedState>,
    Extension(caller): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<SettingQuery>,
) -> ApiResult<Json<Vec<SettingView>>> {
    let include_private = is_truthy(query.include_private.as_deref()) && caller.is_admin();
    let settings = SettingService::new(&state.db)
        .list(query.category, include_private)
        .await?;
    Ok(Json(settings))
}

async fn public(State(state): State<SharedState>) -> ApiResult<Json<Vec<SettingView>>> {
    Ok(Json(SettingService::new(&state.db).public().await?))
}

async fn grouped(
    State(state): State<SharedState>,
    Extension(caller): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<GroupedQuery>,
) -> ApiResult<Json<BTreeMap<String, Vec<SettingView>>>> {
    let include_private = is_truthy(query.include_private.as_deref()) && caller.is_admin();
    Ok(Json(SettingService::new(&state.db).grouped(include_private).await?))
}

async fn create(
    State(state): State<SharedState>,
    Extension(caller): Extension<AuthUser>,
    ApiJson(input): ApiJson<NewSetting>,
) -> ApiResult<(StatusCode, Json<SettingView>)> {
    let created = SettingService::new(&state.db).create(input, &caller).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn bulk(
    State(state): State<SharedState>,
    Extension(caller): Extension<AuthUser>,
    ApiJson(entries): ApiJson<Vec<BulkSettingEntry>>,
) -> Json<BulkResult> {
    Json(SettingService::new(&state.db).bulk(entries, &caller).await)
}

async fn get_one(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> ApiResult<Json<SettingView>> {
    Ok(Json(SettingService::new(&state.db).get(&key).await?))
}

async fn update(
    State(state): State<SharedState>,
    Extension(caller): Extension<AuthUser>,
    Path(key): Path<String>,
    ApiJson(patch): ApiJson<SettingPatch>,
) -> ApiResult<Json<SettingView>> {
    let setting = SettingService::new(&state.db)
        .update(&key, patch, &caller)
        .await?;
    Ok(Json(setting))
}

async fn remove(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> ApiResult<Json<ActionResult>> {
    SettingService::new(&state.db).delete(&key).await?;
    Ok(Json(ActionResult::ok("Setting deleted")))
}
