//! `/api/hr/employees`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};

use super::{ApiJson, ApiQuery, SharedState};
use crate::auth::{guard, ADMINS, MANAGERS};
use crate::error::ApiResult;
use crate::services::employees::{EmployeeService, EmployeeSummary};
use zarmind_core::{Employee, EmployeePatch, EmployeeQuery, NewEmployee, PagedResult};

pub fn router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/", get(list).route_layer(guard!(state, MANAGERS)))
        .route("/", post(create).route_layer(guard!(state, MANAGERS)))
        .route("/summary", get(summary).route_layer(guard!(state, MANAGERS)))
        .route("/{id}", get(get_one).route_layer(guard!(state, MANAGERS)))
        .route("/{id}", patch(update).route_layer(guard!(state, MANAGERS)))
        .route("/{id}", delete(remove).route_layer(guard!(state, ADMINS)))
}

async fn list(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<EmployeeQuery>,
) -> ApiResult<Json<PagedResult<Employee>>> {
    Ok(Json(EmployeeService::new(&state.db).list(&query).await?))
}

async fn create(
    State(state): State<SharedState>,
    ApiJson(input): ApiJson<NewEmployee>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    let created = EmployeeService::new(&state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn summary(State(state): State<SharedState>) -> ApiResult<Json<EmployeeSummary>> {
    Ok(Json(EmployeeService::new(&state.db).summary().await?))
}

async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Employee>> {
    Ok(Json(EmployeeService::new(&state.db).get(&id).await?))
}

async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<EmployeePatch>,
) -> ApiResult<Json<Employee>> {
    Ok(Json(EmployeeService::new(&state.db).update(&id, patch).await?))
}

/// Terminates; the record is returned with its new status.
async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Employee>> {
    Ok(Json(EmployeeService::new(&state.db).remove(&id).await?))
}
