//! # Validation Module
//!
//! Input validation for coupon definitions and validation requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP binding (serde)                                         │
//! │  ├── Types and required fields                                         │
//! │  └── Malformed JSON → 400                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Code format, discount ranges, window ordering                     │
//! │  └── ValidationError → 400                                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── UNIQUE(code) → 409                                                │
//! │                                                                         │
//! │  NOTE: input validation is NOT coupon eligibility. Eligibility lives   │
//! │  in `engine` and produces Rejections, not errors.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use coupon_core::validation::{validate_code, validate_discount};
//! use coupon_core::DiscountType;
//!
//! validate_code("SAVE10").unwrap();
//! validate_discount(DiscountType::Percentage, 10.0).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::{DiscountType, NewCoupon, TimeWindow, ValidationContext};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a coupon code.
pub const MAX_CODE_LENGTH: usize = 50;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a coupon code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use coupon_core::validation::validate_code;
///
/// assert!(validate_code("SAVE10").is_ok());
/// assert!(validate_code("").is_err());
/// assert!(validate_code("SAVE 10").is_err());
/// ```
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > MAX_CODE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LENGTH,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates the user identifier on a validation request.
pub fn validate_user_id(user_id: &str) -> ValidationResult<()> {
    if user_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "user_id".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a monetary amount: finite and not negative.
pub fn validate_amount(field: &str, amount: f64) -> ValidationResult<()> {
    if !amount.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if amount < 0.0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a discount value for its type.
///
/// ## Rules
/// - Finite, not negative
/// - Percentage discounts at most 100
///
/// ## Example
/// ```rust
/// use coupon_core::validation::validate_discount;
/// use coupon_core::DiscountType;
///
/// assert!(validate_discount(DiscountType::Percentage, 100.0).is_ok());
/// assert!(validate_discount(DiscountType::Percentage, 100.5).is_err());
/// assert!(validate_discount(DiscountType::Fixed, 250.0).is_ok());
/// ```
pub fn validate_discount(discount_type: DiscountType, value: f64) -> ValidationResult<()> {
    validate_amount("discount_value", value)?;

    if discount_type == DiscountType::Percentage && value > 100.0 {
        return Err(ValidationError::OutOfRange {
            field: "discount_value".to_string(),
            min: 0.0,
            max: 100.0,
        });
    }

    Ok(())
}

/// Validates a time window: start strictly before end.
pub fn validate_time_window(window: &TimeWindow) -> ValidationResult<()> {
    if window.start_time >= window.end_time {
        return Err(ValidationError::InvalidRange {
            field: "valid_time_window".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Validates a coupon creation payload.
///
/// A time-based coupon without a window is accepted; the engine skips the
/// window check for it.
pub fn validate_new_coupon(coupon: &NewCoupon) -> ValidationResult<()> {
    validate_code(&coupon.code)?;
    validate_discount(coupon.discount_type, coupon.discount_value)?;
    validate_amount("min_order_value", coupon.min_order_value)?;

    if coupon.max_usage_per_user < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "max_usage_per_user".to_string(),
        });
    }

    if let Some(window) = &coupon.valid_time_window {
        validate_time_window(window)?;
    }

    Ok(())
}

/// Validates a validation request before it reaches the engine.
pub fn validate_context(ctx: &ValidationContext) -> ValidationResult<()> {
    if ctx.coupon_code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "coupon_code".to_string(),
        });
    }
    validate_user_id(&ctx.user_id)?;
    validate_amount("order_total", ctx.order_total)
}

// =============================================================================
// Unit Tests
// =============================================================================
