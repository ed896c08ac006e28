//! `/api/auth`.

use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::json;

use super::{ApiJson, SharedState};
use crate::auth::{auth_cookie, clear_cookie, guard, AuthUser, ANY_ROLE};
use crate::error::{ApiError, ApiResult};
use crate::services::auth::{AuthService, LoginRequest};
use zarmind_core::User;

pub fn router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me).route_layer(guard!(state, ANY_ROLE)))
}

async fn login(
    State(state): State<SharedState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Response> {
    let session = AuthService::new(&state.db, &state.jwt).login(&request).await?;
    let cookie = state
        .config
        .auth_use_cookies
        .then(|| auth_cookie(&state.config, &session.token));

    let mut response = Json(session.response()).into_response();
    if let Some(cookie) = cookie {
        response
            .headers_mut()
            .insert(header::SET_COOKIE, header_value(&cookie)?);
    }
    Ok(response)
}

async fn logout(State(state): State<SharedState>) -> ApiResult<Response> {
    let mut response = Json(json!({ "success": true })).into_response();
    if state.config.auth_use_cookies {
        response
            .headers_mut()
            .insert(header::SET_COOKIE, header_value(&clear_cookie(&state.config))?);
    }
    Ok(response)
}

async fn me(
    State(state): State<SharedState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<User>> {
    Ok(Json(AuthService::new(&state.db, &state.jwt).me(&caller).await?))
}

fn header_value(raw: &str) -> ApiResult<HeaderValue> {
    HeaderValue::from_str(raw).map_err(|_| ApiError::internal("Invalid cookie value"))
}
