//! # Error Types
//!
//! Domain-specific error types for coupon-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  coupon-core errors (this file)                                        │
//! │  ├── Rejection        - Coupon refused (a VALID outcome, not a fault)  │
//! │  └── ValidationError  - Malformed input                                │
//! │                                                                         │
//! │  coupon-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  coupon-service errors                                                 │
//! │  └── ServiceError     - Infrastructure failures surfaced to callers    │
//! │                                                                         │
//! │  Rejection → ValidationResponse { is_valid: false, reason }            │
//! │  DbError   → ServiceError → ApiError (HTTP 500)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Rejection messages ARE the wire format: clients match on them
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Rejection
// =============================================================================

/// Why a coupon was refused for a cart.
///
/// The `Display` text of each variant is the machine-readable `reason` string
/// returned to clients, so it must not change.
///
/// ## Check Order
/// ```text
/// CouponNotFound → CouponExpired → MinOrderValueNotMet
///      → InvalidTimeWindow → MaxUsageExceeded → CouponNotApplicable
/// ```
/// The first failing check wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// No active coupon with the requested code.
    #[error("coupon not found")]
    CouponNotFound,

    /// The validation timestamp is at or past the expiry date.
    #[error("coupon has expired")]
    CouponExpired,

    /// Order total is below the coupon's minimum order value.
    #[error("minimum order value not met")]
    MinOrderValueNotMet,

    /// Time-based coupon used outside its window.
    #[error("coupon not valid in current time window")]
    InvalidTimeWindow,

    /// One-time coupon already used by this user.
    #[error("maximum usage per user exceeded")]
    MaxUsageExceeded,

    /// Coupon is restricted and no cart item matches.
    #[error("coupon not applicable to cart items")]
    CouponNotApplicable,
}

impl Rejection {
    /// Returns the reason string sent to clients.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., bad characters, NaN).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Start of a range is not before its end.
    #[error("{field} start must be before end")]
    InvalidRange { field: String },
}

// =============================================================================
// Unit Tests
// =============================================================================
