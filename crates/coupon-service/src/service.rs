//! # Coupon Service
//!
//! Orchestrates store, cache and engine for the three coupon operations.
//!
//! ## Validation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_coupon(ctx)                                                  │
//! │                                                                         │
//! │  validate_context ──✗──► Err(Validation)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────── lock(code) ─────────────────────────────────────┐   │
//! │  │ resolve: cache ──miss──► store.get_by_code ──► cache.put        │   │
//! │  │       │ None ─────────────────────────► CouponNotFound           │   │
//! │  │       ▼                                                          │   │
//! │  │ engine::check_before_usage ──✗──► expired / min order / window   │   │
//! │  │       ▼                                                          │   │
//! │  │ one-time? store.get_user_usage_count                             │   │
//! │  │       ▼                                                          │   │
//! │  │ engine::check_after_usage ──✗──► usage cap / not applicable      │   │
//! │  │       ▼                                                          │   │
//! │  │ store.record_usage ──✗──► Err(Store)                             │   │
//! │  └───────┬──────────────────────────────────────────────────────────┘   │
//! │          ▼                                                              │
//! │  Ok(ValidationResponse::applied(discount))                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rejections come back as `Ok` with `is_valid = false`. Only input and
//! store failures are `Err`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use coupon_core::validation::{validate_amount, validate_context, validate_new_coupon};
use coupon_core::{engine, CartItem, Coupon, CouponUsage, NewCoupon, Rejection};
use coupon_core::{ValidationContext, ValidationResponse};

use crate::cache::{applicable_key, CouponCache};
use crate::error::{ServiceError, ServiceResult};
use crate::locks::KeyedLocks;
use crate::store::CouponStore;

/// Coupon operations over an injected store and cache.
pub struct CouponService {
    store: Arc<dyn CouponStore>,
    cache: Arc<dyn CouponCache>,
    locks: KeyedLocks,
}

impl std::fmt::Debug for CouponService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CouponService")
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

impl CouponService {
    pub fn new(store: Arc<dyn CouponStore>, cache: Arc<dyn CouponCache>) -> Self {
        CouponService {
            store,
            cache,
            locks: KeyedLocks::new(),
        }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Validates and persists a new coupon.
    ///
    /// ## Errors
    /// * `ServiceError::Validation` - bad payload
    /// * `ServiceError::DuplicateCode` - code already taken
    /// * `ServiceError::Store` - anything else from the store
    pub async fn create_coupon(&self, new: NewCoupon) -> ServiceResult<Coupon> {
        validate_new_coupon(&new)?;

        let coupon = new.into_coupon(Utc::now());

        match self.store.create_coupon(&coupon).await {
            Ok(()) => {
                info!(
                    code = %coupon.code,
                    coupon_id = %coupon.id,
                    usage_type = ?coupon.usage_type,
                    "Coupon created"
                );
                Ok(coupon)
            }
            Err(e) if e.is_unique_violation() => {
                debug!(code = %coupon.code, "Duplicate coupon code");
                Err(ServiceError::DuplicateCode(coupon.code))
            }
            Err(e) => {
                warn!(code = %coupon.code, error = %e, "Failed to create coupon");
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Validate
    // =========================================================================

    /// Decides whether `ctx.coupon_code` applies and records the redemption.
    ///
    /// Validations of the same code are serialized, so two concurrent
    /// redemptions of a one-time coupon by one user cannot both succeed.
    pub async fn validate_coupon(&self, ctx: &ValidationContext) -> ServiceResult<ValidationResponse> {
        validate_context(ctx)?;

        let code = ctx.coupon_code.trim();
        let _guard = self.locks.lock(code).await;

        let Some(coupon) = self.resolve(code).await? else {
            return Ok(self.reject(ctx, Rejection::CouponNotFound));
        };

        if let Err(rejection) = engine::check_before_usage(&coupon, ctx) {
            return Ok(self.reject(ctx, rejection));
        }

        let prior_uses = if engine::requires_usage_count(&coupon) {
            self.store
                .get_user_usage_count(&coupon.id, &ctx.user_id)
                .await
                .inspect_err(|e| {
                    warn!(coupon_id = %coupon.id, user_id = %ctx.user_id, error = %e, "Usage count failed")
                })?
        } else {
            0
        };

        let discount = match engine::check_after_usage(&coupon, ctx, prior_uses) {
            Ok(discount) => discount,
            Err(rejection) => return Ok(self.reject(ctx, rejection)),
        };

        let usage = CouponUsage::new(&coupon, ctx.user_id.clone(), ctx.timestamp);
        if let Err(e) = self.store.record_usage(&usage).await {
            warn!(
                code = %coupon.code,
                user_id = %ctx.user_id,
                error = %e,
                "Failed to record coupon usage"
            );
            return Err(e.into());
        }

        info!(
            code = %coupon.code,
            user_id = %ctx.user_id,
            total_discount = discount.total_discount,
            "Coupon applied"
        );
        Ok(ValidationResponse::applied(discount))
    }

    /// Cache first, then the store. Found coupons populate the cache.
    async fn resolve(&self, code: &str) -> ServiceResult<Option<Coupon>> {
        if let Some(coupon) = self.cache.get_coupon(code) {
            debug!(code, "Coupon cache hit");
            return Ok(Some(coupon));
        }

        debug!(code, "Coupon cache miss");
        let found = self
            .store
            .get_by_code(code)
            .await
            .inspect_err(|e| warn!(code, error = %e, "Coupon lookup failed"))?;

        if let Some(coupon) = &found {
            self.cache.put_coupon(coupon.clone());
        }
        Ok(found)
    }

    fn reject(&self, ctx: &ValidationContext, rejection: Rejection) -> ValidationResponse {
        debug!(
            code = %ctx.coupon_code,
            user_id = %ctx.user_id,
            reason = %rejection,
            "Coupon rejected"
        );
        ValidationResponse::rejected(rejection)
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Reports whether the backing store answers queries.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.store.health_check().await;
        if !healthy {
            warn!("Coupon store failed its health check");
        }
        healthy
    }

    // =========================================================================
    // Applicable Listing
    // =========================================================================

    /// Coupons usable for this cart and total at `at`, in creation order.
    ///
    /// Store prefilter (active, unexpired, minimum met) then cart
    /// applicability. Results are cached per cart, exact total and exact instant.
    pub async fn get_applicable_coupons(
        &self,
        cart_items: &[CartItem],
        order_total: f64,
        at: DateTime<Utc>,
    ) -> ServiceResult<Vec<Coupon>> {
        validate_amount("order_total", order_total)?;

        let key = applicable_key(cart_items, order_total, at);
        if let Some(hit) = self.cache.get_applicable(&key) {
            debug!(count = hit.len(), "Applicable coupons cache hit");
            return Ok(hit);
        }

        let candidates = self
            .store
            .get_applicable_coupons(order_total, at)
            .await
            .inspect_err(|e| warn!(order_total, error = %e, "Applicable coupon query failed"))?;

        let applicable: Vec<Coupon> = candidates
            .into_iter()
            .filter(|coupon| engine::is_applicable_to_cart(coupon, cart_items))
            .collect();

        debug!(count = applicable.len(), order_total, "Applicable coupons computed");
        self.cache.put_applicable(key, applicable.clone());
        Ok(applicable)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
