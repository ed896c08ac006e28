//! `/api/crm/customers`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};

use super::{ApiJson, ApiQuery, SharedState};
use crate::auth::{guard, ANY_ROLE, FINANCE, MANAGERS, SALES};
use crate::error::ApiResult;
use crate::services::customers::CustomerService;
use crate::services::ActionResult;
use zarmind_core::{
    Customer, CustomerPatch, CustomerQuery, LedgerEntry, NewCustomer, PagedResult,
};

pub fn router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/", get(list).route_layer(guard!(state, ANY_ROLE)))
        .route("/", post(create).route_layer(guard!(state, SALES)))
        .route("/{id}", get(get_one).route_layer(guard!(state, ANY_ROLE)))
        .route("/{id}", patch(update).route_layer(guard!(state, SALES)))
        .route("/{id}", delete(remove).route_layer(guard!(state, MANAGERS)))
        .route("/{id}/receivables", get(receivables).route_layer(guard!(state, FINANCE)))
}

async fn list(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<CustomerQuery>,
) -> ApiResult<Json<PagedResult<Customer>>> {
    Ok(Json(CustomerService::new(&state.db).list(&query).await?))
}

async fn create(
    State(state): State<SharedState>,
    ApiJson(input): ApiJson<NewCustomer>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let created = CustomerService::new(&state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(CustomerService::new(&state.db).get(&id).await?))
}

async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<CustomerPatch>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(CustomerService::new(&state.db).update(&id, patch).await?))
}

async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionResult>> {
    let removal = CustomerService::new(&state.db).remove(&id).await?;
    Ok(Json(ActionResult::removed("Customer", removal)))
}

async fn receivables(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<LedgerEntry>>> {
    Ok(Json(CustomerService::new(&state.db).receivables(&id).await?))
}
