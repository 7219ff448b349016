//! # Validation Engine
//!
//! Decides whether a coupon applies to a cart and computes the discount.
//!
//! ## Decision Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Coupon Validation Pipeline                           │
//! │                                                                         │
//! │  (orchestrator) resolve code ── none ──► CouponNotFound                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────── check_before_usage ─────────────────────┐       │
//! │  │ 1. now >= expiry_date?          ──► CouponExpired           │       │
//! │  │ 2. order_total < min_order?     ──► MinOrderValueNotMet     │       │
//! │  │ 3. time-based & outside window? ──► InvalidTimeWindow       │       │
//! │  └──────────────────────────────────────────────────────────────┘       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  (orchestrator) prior uses = store count, only if one-time             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────── check_after_usage ──────────────────────┐       │
//! │  │ 4. one-time & prior uses > 0?   ──► MaxUsageExceeded        │       │
//! │  │ 5. restricted & no item match?  ──► CouponNotApplicable     │       │
//! │  │ 6. calculate_discount                                        │       │
//! │  └──────────────────────────────────────────────────────────────┘       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  (orchestrator) record usage ── fails ──► internal error               │
//! │                                                                         │
//! │  First failing check wins. Order is part of the contract.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pipeline is split in two so the usage counter, the only piece that
//! needs I/O, is queried by the caller between the halves and only when
//! [`requires_usage_count`] says so.
//!
//! ## Usage
//! ```rust
//! use chrono::{Duration, Utc};
//! use coupon_core::engine;
//! use coupon_core::{DiscountType, NewCoupon, UsageType, ValidationContext};
//!
//! let now = Utc::now();
//! let coupon = NewCoupon {
//!     code: "SAVE10".into(),
//!     expiry_date: now + Duration::days(30),
//!     usage_type: UsageType::MultiUse,
//!     discount_type: DiscountType::Percentage,
//!     discount_value: 10.0,
//!     min_order_value: 100.0,
//!     applicable_medicine_ids: vec![],
//!     applicable_categories: vec![],
//!     valid_time_window: None,
//!     terms_and_conditions: String::new(),
//!     max_usage_per_user: 0,
//!     is_active: true,
//! }
//! .into_coupon(now);
//!
//! let ctx = ValidationContext {
//!     coupon_code: "SAVE10".into(),
//!     cart_items: vec![],
//!     order_total: 200.0,
//!     timestamp: now,
//!     user_id: "U1".into(),
//! };
//!
//! let discount = engine::evaluate(&coupon, &ctx, 0).unwrap();
//! assert_eq!(discount.items_discount, 20.0);
//! ```

use crate::error::Rejection;
use crate::types::{CartItem, Coupon, Discount, DiscountType, UsageType, ValidationContext};

/// Result type for engine decisions.
pub type Decision<T> = Result<T, Rejection>;

/// Runs the expiry, minimum order value and time window checks.
pub fn check_before_usage(coupon: &Coupon, ctx: &ValidationContext) -> Decision<()> {
    if coupon.is_expired_at(ctx.timestamp) {
        return Err(Rejection::CouponExpired);
    }

    if ctx.order_total < coupon.min_order_value {
        return Err(Rejection::MinOrderValueNotMet);
    }

    // A time-based coupon without a window skips this check.
    if coupon.usage_type == UsageType::TimeBased {
        if let Some(window) = coupon.valid_time_window {
            if !window.contains(ctx.timestamp) {
                return Err(Rejection::InvalidTimeWindow);
            }
        }
    }

    Ok(())
}

/// Whether the caller must look up the user's prior usage count.
///
/// Only one-time coupons are capped. Multi-use and time-based coupons ignore
/// `max_usage_per_user`.
pub fn requires_usage_count(coupon: &Coupon) -> bool {
    coupon.usage_type == UsageType::OneTime
}

/// Runs the usage cap and cart checks, then computes the discount.
///
/// `prior_uses` is ignored unless [`requires_usage_count`] is true.
pub fn check_after_usage(
    coupon: &Coupon,
    ctx: &ValidationContext,
    prior_uses: i64,
) -> Decision<Discount> {
    if requires_usage_count(coupon) && prior_uses > 0 {
        return Err(Rejection::MaxUsageExceeded);
    }

    if !is_applicable_to_cart(coupon, &ctx.cart_items) {
        return Err(Rejection::CouponNotApplicable);
    }

    Ok(calculate_discount(coupon, ctx.order_total))
}

/// Runs the whole pipeline for a caller that already knows `prior_uses`.
pub fn evaluate(coupon: &Coupon, ctx: &ValidationContext, prior_uses: i64) -> Decision<Discount> {
    check_before_usage(coupon, ctx)?;
    check_after_usage(coupon, ctx, prior_uses)
}

/// Checks whether any cart item matches the coupon's applicability sets.
///
/// Unrestricted coupons apply to every cart, including an empty one.
pub fn is_applicable_to_cart(coupon: &Coupon, items: &[CartItem]) -> bool {
    if !coupon.is_restricted() {
        return true;
    }

    items.iter().any(|item| {
        coupon.applicable_medicine_ids.iter().any(|id| *id == item.id)
            || coupon.applicable_categories.iter().any(|c| *c == item.category)
    })
}

/// Computes the discount breakdown.
///
/// Fixed discounts are not clamped to the order total.
pub fn calculate_discount(coupon: &Coupon, order_total: f64) -> Discount {
    let items_discount = match coupon.discount_type {
        DiscountType::Percentage => order_total * (coupon.discount_value / 100.0),
        DiscountType::Fixed => coupon.discount_value,
    };

    Discount::items_only(items_discount)
}

// =============================================================================
// Unit Tests
// =============================================================================
