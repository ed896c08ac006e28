//! `/api/financials/expenses` and `/api/financials/expenses/categories`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Extension, Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;

use super::{ApiJson, ApiQuery, SharedState};
use crate::auth::{guard, AuthUser, ADMINS, FINANCE};
use crate::error::ApiResult;
use crate::services::expenses::{ExpenseService, ExpenseSummary};
use crate::services::ActionResult;
use zarmind_core::{
    Expense, ExpenseCategory, ExpenseCategoryPatch, ExpenseCategoryQuery, ExpensePatch,
    ExpenseQuery, NewExpense, NewExpenseCategory, PagedResult,
};

#[derive(Debug, Default, Deserialize)]
struct PeriodQuery {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

pub fn router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/categories", get(list_categories).route_layer(guard!(state, FINANCE)))
        .route("/categories", post(create_category).route_layer(guard!(state, FINANCE)))
        .route("/categories/{id}", patch(update_category).route_layer(guard!(state, FINANCE)))
        .route("/categories/{id}", delete(remove_category).route_layer(guard!(state, ADMINS)))
        .route("/", get(list).route_layer(guard!(state, FINANCE)))
        .route("/", post(create).route_layer(guard!(state, FINANCE)))
        .route("/summary", get(summary).route_layer(guard!(state, FINANCE)))
        .route("/{id}", get(get_one).route_layer(guard!(state, FINANCE)))
        .route("/{id}", patch(update).route_layer(guard!(state, FINANCE)))
        .route("/{id}", delete(remove).route_layer(guard!(state, ADMINS)))
        .route("/{id}/approve", post(approve).route_layer(guard!(state, FINANCE)))
}

async fn list_categories(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<ExpenseCategoryQuery>,
) -> ApiResult<Json<Vec<ExpenseCategory>>> {
    let categories = ExpenseService::new(&state.db)
        .list_categories(query.search.as_deref())
        .await?;
    Ok(Json(categories))
}

async fn create_category(
    State(state): State<SharedState>,
    ApiJson(input): ApiJson<NewExpenseCategory>,
) -> ApiResult<(StatusCode, Json<ExpenseCategory>)> {
    let created = ExpenseService::new(&state.db).create_category(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_category(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ExpenseCategoryPatch>,
) -> ApiResult<Json<ExpenseCategory>> {
    let updated = ExpenseService::new(&state.db)
        .update_category(&id, patch)
        .await?;
    Ok(Json(updated))
}

async fn remove_category(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionResult>> {
    ExpenseService::new(&state.db).remove_category(&id).await?;
    Ok(Json(ActionResult::ok("Expense category deleted")))
}

async fn list(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<ExpenseQuery>,
) -> ApiResult<Json<PagedResult<Expense>>> {
    Ok(Json(ExpenseService::new(&state.db).list(&query).await?))
}

async fn create(
    State(state): State<SharedState>,
    ApiJson(input): ApiJson<NewExpense>,
) -> ApiResult<(StatusCode, Json<Expense>)> {
    let created = ExpenseService::new(&state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn summary(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> ApiResult<Json<ExpenseSummary>> {
    let summary = ExpenseService::new(&state.db)
        .summary(query.from, query.to)
        .await?;
    Ok(Json(summary))
}

async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Expense>> {
    Ok(Json(ExpenseService::new(&state.db).get(&id).await?))
}

async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ExpensePatch>,
) -> ApiResult<Json<Expense>> {
    Ok(Json(ExpenseService::new(&state.db).update(&id, patch).await?))
}

async fn approve(
    State(state): State<SharedState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Expense>> {
    Ok(Json(ExpenseService::new(&state.db).approve(&id, &caller.id).await?))
}

async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionResult>> {
    ExpenseService::new(&state.db).remove(&id).await?;
    Ok(Json(ActionResult::ok("Expense deleted")))
}
