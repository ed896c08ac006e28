//! HTTP routes.
//!
//! Every route declares its path, method and allowed roles on one line:
//!
//! ```text
//! .route("/{id}", get(get_one).route_layer(guard!(state, ANY_ROLE)))
//! .route("/{id}", delete(remove).route_layer(guard!(state, ADMINS)))
//! ```
//!
//! Registering a path again merges the method routers, so each method keeps
//! its own guard. Handlers are thin: extract, call the service, wrap the
//! result in `Json`.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::{Json, Router};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::AppState;

pub mod auth;
pub mod branches;
pub mod cash;
pub mod customers;
pub mod employees;
pub mod expenses;
pub mod financials;
pub mod health;
pub mod inventory;
pub mod payroll;
pub mod purchases;
pub mod reports;
pub mod settings;
pub mod suppliers;
pub mod users;
pub mod work_orders;
pub mod workshops;

pub type SharedState = Arc<AppState>;

pub fn api_router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .nest("/auth", auth::router(state))
        .nest("/users", users::router(state))
        .nest("/management/branches", branches::router(state))
        .nest("/crm/customers", customers::router(state))
        .nest("/suppliers", suppliers::router(state))
        .nest("/hr/employees", employees::router(state))
        .nest("/hr/payroll", payroll::router(state))
        .nest("/workshops", workshops::router(state))
        .nest("/inventory/products", inventory::router(state))
        .nest("/financials", financials::router(state))
        .nest("/transactions/purchases", purchases::router(state))
        .nest("/settings", settings::router(state))
        .merge(reports::router(state))
        .merge(health::router())
}

/// `Json` whose rejections use the API error body (400).
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_error(rejection)),
        }
    }
}

fn json_error(rejection: JsonRejection) -> ApiError {
    ApiError::validation(rejection.body_text())
}

/// `Query` whose rejections use the API error body (400).
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(query_error(rejection)),
        }
    }
}

fn query_error(rejection: QueryRejection) -> ApiError {
    ApiError::validation(rejection.body_text())
}
