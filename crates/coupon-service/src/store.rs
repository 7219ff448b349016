//! # Coupon Store Seam
//!
//! The three collaborator capabilities the engine needs (lookup, usage
//! counter, usage sink) plus creation and the applicability prefilter,
//! behind one object-safe trait.
//!
//! ```text
//! ┌──────────────────┐      Arc<dyn CouponStore>      ┌──────────────────┐
//! │  CouponService   │ ─────────────────────────────► │ coupon_db::      │
//! │                  │                                │   Database       │
//! └──────────────────┘                                └──────────────────┘
//!                              tests: MockCouponStore
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

use coupon_core::{Coupon, CouponUsage};
use coupon_db::{Database, DbError};

/// Persistence operations used by the coupon service.
#[automock]
#[async_trait]
pub trait CouponStore: Send + Sync {
    /// Persists a new coupon. A taken code is `DbError::UniqueViolation`.
    async fn create_coupon(&self, coupon: &Coupon) -> Result<(), DbError>;

    /// Active coupon by code. Absence is `Ok(None)`.
    async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>, DbError>;

    /// Active, unexpired coupons whose minimum is met, in creation order.
    async fn get_applicable_coupons(
        &self,
        order_total: f64,
        at: DateTime<Utc>,
    ) -> Result<Vec<Coupon>, DbError>;

    /// Appends a usage record.
    async fn record_usage(&self, usage: &CouponUsage) -> Result<(), DbError>;

    /// Prior redemptions of `coupon_id` by `user_id`.
    async fn get_user_usage_count(&self, coupon_id: &str, user_id: &str) -> Result<i64, DbError>;

    /// Whether the store can currently answer queries.
    async fn health_check(&self) -> bool;
}

#[async_trait]
impl CouponStore for Database {
    async fn create_coupon(&self, coupon: &Coupon) -> Result<(), DbError> {
        self.coupons().insert(coupon).await
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>, DbError> {
        self.coupons().get_by_code(code).await
    }

    async fn get_applicable_coupons(
        &self,
        order_total: f64,
        at: DateTime<Utc>,
    ) -> Result<Vec<Coupon>, DbError> {
        self.coupons().get_applicable(order_total, at).await
    }

    async fn record_usage(&self, usage: &CouponUsage) -> Result<(), DbError> {
        self.usages().record(usage).await
    }

    async fn get_user_usage_count(&self, coupon_id: &str, user_id: &str) -> Result<i64, DbError> {
        self.usages().count_for_user(coupon_id, user_id).await
    }

    async fn health_check(&self) -> bool {
        Database::health_check(self).await
    }
}
