//! `/api/hr/payroll`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use super::{ApiJson, ApiQuery, SharedState};
use crate::auth::{guard, ADMINS, FINANCE};
use crate::error::ApiResult;
use crate::services::payroll::PayrollService;
use crate::services::ActionResult;
use zarmind_core::{GeneratePayroll, PagedResult, PayPayroll, Payroll, PayrollQuery};

pub fn router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/", get(list).route_layer(guard!(state, FINANCE)))
        .route("/generate", post(generate).route_layer(guard!(state, FINANCE)))
        .route("/{id}", get(get_one).route_layer(guard!(state, FINANCE)))
        .route("/{id}", delete(remove).route_layer(guard!(state, ADMINS)))
        .route("/{id}/pay", post(mark_paid).route_layer(guard!(state, FINANCE)))
}

async fn list(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<PayrollQuery>,
) -> ApiResult<Json<PagedResult<Payroll>>> {
    Ok(Json(PayrollService::new(&state.db).list(&query).await?))
}

async fn generate(
    State(state): State<SharedState>,
    ApiJson(input): ApiJson<GeneratePayroll>,
) -> ApiResult<(StatusCode, Json<Payroll>)> {
    let created = PayrollService::new(&state.db).generate(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Payroll>> {
    Ok(Json(PayrollService::new(&state.db).get(&id).await?))
}

async fn mark_paid(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<PayPayroll>,
) -> ApiResult<Json<Payroll>> {
    Ok(Json(PayrollService::new(&state.db).mark_paid(&id, input).await?))
}

async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionResult>> {
    PayrollService::new(&state.db).remove(&id).await?;
    Ok(Json(ActionResult::ok("Payroll record deleted")))
}
