//! Request and response bodies that are not domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coupon_core::{CartItem, Coupon, ValidationContext};

/// Body of `GET|POST /api/v1/coupons/applicable`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicableRequest {
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
    pub order_total: f64,
    /// Defaults to the server clock.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicableResponse {
    pub applicable_coupons: Vec<Coupon>,
}

/// Body of `POST /api/v1/coupons/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub coupon_code: String,
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
    pub order_total: f64,
    /// Defaults to the server clock.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub user_id: String,
}

impl ValidateRequest {
    pub fn into_context(self, now: DateTime<Utc>) -> ValidationContext {
        ValidationContext {
            coupon_code: self.coupon_code,
            cart_items: self.cart_items,
            order_total: self.order_total,
            timestamp: self.timestamp.unwrap_or(now),
            user_id: self.user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_missing_timestamp_uses_now() {
        let req: ValidateRequest = serde_json::from_str(
            r#"{"coupon_code": "SAVE10", "order_total": 200, "user_id": "U1"}"#,
        )
        .unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        let ctx = req.into_context(now);
        assert_eq!(ctx.timestamp, now);
        assert!(ctx.cart_items.is_empty());
    }

    #[test]
    fn test_explicit_timestamp_wins() {
        let req: ValidateRequest = serde_json::from_str(
            r#"{"coupon_code": "SAVE10", "order_total": 200, "user_id": "U1",
                "timestamp": "2025-03-01T09:00:00Z"}"#,
        )
        .unwrap();
        let ctx = req.into_context(Utc::now());
        assert_eq!(ctx.timestamp, Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
    }
}
