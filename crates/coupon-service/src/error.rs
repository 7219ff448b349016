//! Service error types.
//!
//! Rejections are NOT errors here: a refused coupon comes back as
//! `Ok(ValidationResponse { is_valid: false, .. })`. `ServiceError` only
//! covers bad input and infrastructure failures.

use coupon_core::ValidationError;
use coupon_db::DbError;
use thiserror::Error;

/// Errors returned by [`CouponService`](crate::CouponService).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed validation before touching the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A coupon with this code already exists.
    #[error("coupon code '{0}' already exists")]
    DuplicateCode(String),

    /// The store failed (connection, query, usage recording, ...).
    #[error("store error: {0}")]
    Store(#[from] DbError),
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ServiceError::DuplicateCode("SAVE10".into());
        assert_eq!(err.to_string(), "coupon code 'SAVE10' already exists");

        let err: ServiceError = ValidationError::Required {
            field: "code".into(),
        }
        .into();
        assert_eq!(err.to_string(), "code is required");

        let err: ServiceError = DbError::PoolExhausted.into();
        assert_eq!(err.to_string(), "store error: Connection pool exhausted");
    }
}
