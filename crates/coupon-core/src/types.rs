//! # Domain Types
//!
//! Core domain types used throughout the coupon engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  PERSISTED                                                              │
//! │  ┌─────────────────────┐            ┌─────────────────┐                 │
//! │  │      Coupon         │ 1 ──── n   │  CouponUsage    │                 │
//! │  │  ─────────────────  │            │  ─────────────  │                 │
//! │  │  id (UUID)          │            │  id (UUID)      │                 │
//! │  │  code (business)    │            │  coupon_id (FK) │                 │
//! │  │  usage_type         │            │  user_id        │                 │
//! │  │  discount_type      │            │  used_at        │                 │
//! │  │  valid_time_window  │            └─────────────────┘                 │
//! │  └─────────────────────┘              append-only                       │
//! │                                                                         │
//! │  CALLER-SUPPLIED / DERIVED (never persisted)                            │
//! │  ┌─────────────────┐  ┌───────────────────┐  ┌────────────────────┐    │
//! │  │   CartItem      │  │ ValidationContext │  │     Discount       │    │
//! │  │  id, category   │  │ code, cart, total │  │ items + charges    │    │
//! │  │  price, qty     │  │ timestamp, user   │  │ = total            │    │
//! │  └─────────────────┘  └───────────────────┘  └────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every coupon has:
//! - `id`: UUID v4 - immutable, used by usage records
//! - `code`: human-readable, unique, what shoppers type at checkout

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::Rejection;

// =============================================================================
// Usage Type
// =============================================================================

/// Redemption rules attached to a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UsageType {
    /// Each user may redeem it once.
    OneTime,
    /// Redeemable repeatedly.
    MultiUse,
    /// Redeemable only inside `valid_time_window`.
    TimeBased,
}

impl Default for UsageType {
    fn default() -> Self {
        UsageType::MultiUse
    }
}

// =============================================================================
// Discount Type
// =============================================================================

/// How `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` percent of the order total.
    Percentage,
    /// `discount_value` flat off the order.
    Fixed,
}

// =============================================================================
// Time Window
// =============================================================================

/// Valid time window for time-based coupons.
///
/// Start is inclusive, end is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TimeWindow {
    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,
    #[ts(as = "String")]
    pub end_time: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a window from its bounds.
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        TimeWindow {
            start_time,
            end_time,
        }
    }

    /// Checks whether `at` falls inside `[start_time, end_time)`.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start_time && at < self.end_time
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// A discount coupon definition.
///
/// ## Applicability
/// `applicable_medicine_ids` and `applicable_categories` both empty means the
/// coupon applies to any cart. Otherwise at least one cart item must match
/// either list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Coupon {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Code typed by the shopper. Unique.
    pub code: String,

    /// The coupon is unusable at or after this instant.
    #[ts(as = "String")]
    pub expiry_date: DateTime<Utc>,

    pub usage_type: UsageType,

    pub discount_type: DiscountType,

    /// Percent (0-100) or flat amount, depending on `discount_type`.
    pub discount_value: f64,

    /// Minimum order total required.
    pub min_order_value: f64,

    #[serde(default)]
    pub applicable_medicine_ids: Vec<String>,

    #[serde(default)]
    pub applicable_categories: Vec<String>,

    /// Only consulted for time-based coupons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_time_window: Option<TimeWindow>,

    #[serde(default)]
    pub terms_and_conditions: String,

    /// Only enforced for one-time coupons (see `engine`).
    pub max_usage_per_user: i64,

    /// Soft-deactivation flag. Inactive coupons are invisible to lookups.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    /// Checks if the coupon restricts itself to specific items or categories.
    pub fn is_restricted(&self) -> bool {
        !self.applicable_medicine_ids.is_empty() || !self.applicable_categories.is_empty()
    }

    /// Checks if the coupon is expired at `at`.
    ///
    /// A timestamp equal to the expiry date counts as expired.
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.expiry_date
    }
}

// =============================================================================
// New Coupon
// =============================================================================

/// Payload for creating a coupon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCoupon {
    pub code: String,
    #[ts(as = "String")]
    pub expiry_date: DateTime<Utc>,
    pub usage_type: UsageType,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    #[serde(default)]
    pub min_order_value: f64,
    #[serde(default)]
    pub applicable_medicine_ids: Vec<String>,
    #[serde(default)]
    pub applicable_categories: Vec<String>,
    #[serde(default)]
    pub valid_time_window: Option<TimeWindow>,
    #[serde(default)]
    pub terms_and_conditions: String,
    #[serde(default)]
    pub max_usage_per_user: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl NewCoupon {
    /// Builds the persisted form with a fresh id and timestamps.
    pub fn into_coupon(self, now: DateTime<Utc>) -> Coupon {
        Coupon {
            id: Uuid::new_v4().to_string(),
            code: self.code.trim().to_string(),
            expiry_date: self.expiry_date,
            usage_type: self.usage_type,
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            min_order_value: self.min_order_value,
            applicable_medicine_ids: self.applicable_medicine_ids,
            applicable_categories: self.applicable_categories,
            valid_time_window: self.valid_time_window,
            terms_and_conditions: self.terms_and_conditions,
            max_usage_per_user: self.max_usage_per_user,
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// An item in the caller's cart. Supplied per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    /// Medicine id.
    pub id: String,
    pub category: String,
    pub price: f64,
    pub quantity: i64,
}

// =============================================================================
// Validation Context
// =============================================================================

/// Everything the engine needs for one decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationContext {
    pub coupon_code: String,
    pub cart_items: Vec<CartItem>,
    pub order_total: f64,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
}

// =============================================================================
// Coupon Usage
// =============================================================================

/// One successful redemption. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CouponUsage {
    pub id: String,
    pub coupon_id: String,
    pub user_id: String,
    #[ts(as = "String")]
    pub used_at: DateTime<Utc>,
}

impl CouponUsage {
    /// Creates a usage record for `coupon` redeemed by `user_id` at `used_at`.
    pub fn new(coupon: &Coupon, user_id: impl Into<String>, used_at: DateTime<Utc>) -> Self {
        CouponUsage {
            id: Uuid::new_v4().to_string(),
            coupon_id: coupon.id.clone(),
            user_id: user_id.into(),
            used_at,
        }
    }
}

// =============================================================================
// Discount
// =============================================================================

/// Discount breakdown for an accepted coupon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Discount {
    pub items_discount: f64,
    /// Reserved for delivery-fee rules. Always zero today.
    pub charges_discount: f64,
    pub total_discount: f64,
}

impl Discount {
    /// Builds a breakdown where only items are discounted.
    pub fn items_only(items_discount: f64) -> Self {
        let charges_discount = 0.0;
        Discount {
            items_discount,
            charges_discount,
            total_discount: items_discount + charges_discount,
        }
    }
}

// =============================================================================
// Validation Response
// =============================================================================

/// Message returned alongside an accepted coupon.
pub const APPLIED_MESSAGE: &str = "coupon applied successfully";

/// Externally visible result of a validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidationResponse {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Discount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidationResponse {
    /// An accepted coupon.
    pub fn applied(discount: Discount) -> Self {
        ValidationResponse {
            is_valid: true,
            discount: Some(discount),
            message: Some(APPLIED_MESSAGE.to_string()),
            reason: None,
        }
    }

    /// A refused coupon.
    pub fn rejected(rejection: Rejection) -> Self {
        ValidationResponse {
            is_valid: false,
            discount: None,
            message: None,
            reason: Some(rejection.reason()),
        }
    }
}

impl From<Result<Discount, Rejection>> for ValidationResponse {
    fn from(outcome: Result<Discount, Rejection>) -> Self {
        match outcome {
            Ok(discount) => ValidationResponse::applied(discount),
            Err(rejection) => ValidationResponse::rejected(rejection),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_time_window_bounds() {
        let window = TimeWindow::new(at(9), at(17));
        assert!(window.contains(at(9)));
        assert!(window.contains(at(12)));
        assert!(!window.contains(at(17)));
        assert!(!window.contains(at(8)));
    }

    #[test]
    fn test_usage_type_serializes_snake_case() {
        let json = serde_json::to_string(&UsageType::OneTime).unwrap();
        assert_eq!(json, "\"one_time\"");
        let parsed: DiscountType = serde_json::from_str("\"percentage\"").unwrap();
        assert_eq!(parsed, DiscountType::Percentage);
    }

    #[test]
    fn test_new_coupon_defaults() {
        let json = r#"{
            "code": " SAVE10 ",
            "expiry_date": "2030-01-01T00:00:00Z",
            "usage_type": "multi_use",
            "discount_type": "percentage",
            "discount_value": 10.0
        }"#;
        let new: NewCoupon = serde_json::from_str(json).unwrap();
        assert!(new.is_active);
        assert_eq!(new.min_order_value, 0.0);

        let coupon = new.into_coupon(at(10));
        assert_eq!(coupon.code, "SAVE10");
        assert!(!coupon.is_restricted());
        assert_eq!(coupon.created_at, at(10));
        assert!(Uuid::parse_str(&coupon.id).is_ok());
    }

    #[test]
    fn test_expiry_is_inclusive_of_the_instant() {
        let coupon = NewCoupon {
            code: "X".into(),
            expiry_date: at(12),
            usage_type: UsageType::MultiUse,
            discount_type: DiscountType::Fixed,
            discount_value: 5.0,
            min_order_value: 0.0,
            applicable_medicine_ids: vec![],
            applicable_categories: vec![],
            valid_time_window: None,
            terms_and_conditions: String::new(),
            max_usage_per_user: 0,
            is_active: true,
        }
        .into_coupon(at(0));

        assert!(!coupon.is_expired_at(at(12) - Duration::seconds(1)));
        assert!(coupon.is_expired_at(at(12)));
    }

    #[test]
    fn test_response_shapes() {
        let ok = ValidationResponse::applied(Discount::items_only(20.0));
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["is_valid"], true);
        assert_eq!(json["discount"]["total_discount"], 20.0);
        assert_eq!(json["message"], APPLIED_MESSAGE);
        assert!(json.get("reason").is_none());

        let bad: ValidationResponse = Err(Rejection::CouponExpired).into();
        let json = serde_json::to_value(&bad).unwrap();
        assert_eq!(json["is_valid"], false);
        assert_eq!(json["reason"], "coupon has expired");
        assert!(json.get("discount").is_none());
    }
}
