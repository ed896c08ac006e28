//! Error types for the HTTP API.
//!
//! ```text
//! CoreError / ValidationError / DbError
//!        │ From
//!        ▼
//! ApiError { code, message } ──IntoResponse──► status + JSON body
//!
//! { "success": false, "statusCode": 404, "code": "NOT_FOUND",
//!   "message": "Supplier not found" }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use zarmind_core::{CoreError, ValidationError};
use zarmind_db::DbError;

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    BusinessRule,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    DatabaseError,
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError | ErrorCode::BusinessRule => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BusinessRule, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    success: bool,
    status_code: u16,
    code: ErrorCode,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            success: false,
            status_code: status.as_u16(),
            code: self.code,
            message: &self.message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Duplicate { .. } => ApiError::conflict(err.to_string()),
            other => ApiError::validation(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => v.into(),
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => ApiError::not_found(format!("{entity} not found")),
            DbError::UniqueViolation { field, .. } => {
                ApiError::conflict(format!("{field} already exists"))
            }
            DbError::ForeignKeyViolation { message } => {
                error!(%message, "Foreign key violation reached the API");
                ApiError::bad_request("Referenced record not found")
            }
            DbError::CheckViolation { message } => {
                error!(%message, "Check constraint violation reached the API");
                ApiError::validation("Value out of range")
            }
            other => {
                error!(error = %other, "Database error");
                ApiError::new(ErrorCode::DatabaseError, "Database error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zarmind_core::Money;

    #[test]
    fn test_core_errors_are_bad_requests() {
        let err: ApiError = CoreError::reference_not_found("Supplier").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Supplier not found");

        let err: ApiError = CoreError::Overpayment {
            amount: Money::from_major(10.0),
            paid: Money::from_major(10.0),
            requested: Money::from_major(1.0),
        }
        .into();
        assert_eq!(err.code, ErrorCode::BusinessRule);
        assert_eq!(err.message, "Payment amount exceeds total amount");
    }

    #[test]
    fn test_duplicates_are_conflicts() {
        let err: ApiError = ValidationError::Duplicate {
            field: "email".to_string(),
            value: "a@b.c".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = DbError::duplicate("sku", "RG-1").into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.message, "sku already exists");
    }

    #[test]
    fn test_database_details_are_hidden() {
        let err: ApiError = DbError::QueryFailed("no such column: secret".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Database error");

        let err: ApiError = DbError::not_found("Customer", "abc").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Customer not found");
    }
}
