//! Error types and response envelope for the Clinic API.
//!
//! Every response body has the same shape:
//!
//! ```json
//! { "success": true,  "data": { ... } }
//! { "success": false, "error": { "code": "NO_OPEN_DRAWER", "message": "No open cash drawer" } }
//! ```
//!
//! | Code | Status |
//! |------|--------|
//! | VALIDATION_ERROR | 400 |
//! | UNAUTHORIZED | 401 |
//! | FORBIDDEN | 403 |
//! | NOT_FOUND | 404 |
//! | DRAWER_ALREADY_OPEN, CONFLICT | 409 |
//! | NO_OPEN_DRAWER, DRAWER_NOT_OPEN, INSUFFICIENT_STOCK, INVALID_SALE_STATUS | 422 |
//! | DATABASE_ERROR, INTERNAL_ERROR | 500 |

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};
use vetpos_core::{CoreError, ValidationError};
use vetpos_db::DbError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by every handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn unauthorized() -> Self {
        Self::new("UNAUTHORIZED", "Authentication required")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    /// Logs the detail and hides it from the client.
    pub fn database(detail: impl std::fmt::Display) -> Self {
        error!(target: "database", error = %detail, "Database error occurred");
        Self::new("DATABASE_ERROR", "Database error")
    }

    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!(target: "internal", error = %detail, "Internal error occurred");
        Self::new("INTERNAL_ERROR", "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.code {
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "CONFLICT" | "DRAWER_ALREADY_OPEN" => StatusCode::CONFLICT,
            "NO_OPEN_DRAWER" | "DRAWER_NOT_OPEN" | "INSUFFICIENT_STOCK" | "INVALID_SALE_STATUS" => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::NoOpenDrawer => Self::new("NO_OPEN_DRAWER", message),
            CoreError::DrawerAlreadyOpen(_) => Self::new("DRAWER_ALREADY_OPEN", message),
            CoreError::DrawerNotOpen(_) => Self::new("DRAWER_NOT_OPEN", message),
            CoreError::InsufficientStock { .. } => Self::new("INSUFFICIENT_STOCK", message),
            CoreError::InvalidSaleStatus { .. } => Self::new("INVALID_SALE_STATUS", message),
            CoreError::DrawerNotFound(_)
            | CoreError::ItemNotFound(_)
            | CoreError::ServiceNotFound(_)
            | CoreError::SaleNotFound(_) => Self::not_found(message),
            CoreError::EmptySale | CoreError::TooManyLines { .. } => Self::validation(message),
            CoreError::Validation(v) => v.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { .. } => Self::not_found(err.to_string()),
            DbError::UniqueViolation { .. } => Self::conflict(err.to_string()),
            DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => {
                warn!(error = %err, "Constraint rejected request");
                Self::validation("Request violates a data constraint")
            }
            other => Self::database(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

/// Success/failure envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "success": false,
            "error": ErrorBody { code: self.code, message: &self.message },
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Wraps data in a success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data: Some(data),
    })
}

/// 201 with a success envelope.
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, ok(data))
}
