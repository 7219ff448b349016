//! HTTP error responses.
//!
//! Every failure leaves the API as
//! `{"code": "SCREAMING_SNAKE_CASE", "message": "..."}`:
//!
//! | ServiceError / cause  | Status | Code               |
//! |-----------------------|--------|--------------------|
//! | malformed JSON        | 400    | `INVALID_REQUEST`  |
//! | `Validation`          | 400    | `VALIDATION_FAILED`|
//! | `DuplicateCode`       | 409    | `DUPLICATE_CODE`   |
//! | `Store`               | 500    | `INTERNAL_ERROR`   |
//!
//! Coupon rejections are not errors; they are 200 responses with
//! `is_valid = false`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use coupon_service::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    ValidationFailed,
    DuplicateCode,
    InternalError,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::InvalidRequest | ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::DuplicateCode => StatusCode::CONFLICT,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => ApiError::new(ErrorCode::ValidationFailed, e.to_string()),
            ServiceError::DuplicateCode(_) => {
                ApiError::new(ErrorCode::DuplicateCode, err.to_string())
            }
            ServiceError::Store(e) => {
                // Details stay in the log
                error!(error = %e, "Store failure while handling request");
                ApiError::new(ErrorCode::InternalError, "internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(ErrorCode::InvalidRequest, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use coupon_core::ValidationError;
    use coupon_db::DbError;

    #[test]
    fn test_service_error_mapping() {
        let err: ApiError = ServiceError::DuplicateCode("SAVE10".into()).into();
        assert_eq!(err.code, ErrorCode::DuplicateCode);
        assert_eq!(err.code.status(), StatusCode::CONFLICT);
        assert_eq!(err.message, "coupon code 'SAVE10' already exists");

        let err: ApiError = ServiceError::Validation(ValidationError::Required {
            field: "code".into(),
        })
        .into();
        assert_eq!(err.code.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "code is required");

        let err: ApiError = ServiceError::Store(DbError::PoolExhausted).into();
        assert_eq!(err.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "internal server error");
    }

    #[test]
    fn test_codes_serialize_screaming_snake_case() {
        let body = serde_json::to_value(ApiError::new(ErrorCode::ValidationFailed, "x")).unwrap();
        assert_eq!(body["code"], "VALIDATION_FAILED");
        assert_eq!(body["message"], "x");
    }
}
