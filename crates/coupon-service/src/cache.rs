//! # Lookup Cache
//!
//! Short-lived memoization of coupon-by-code and applicable-coupon-set
//! lookups.
//!
//! ## Entry Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         TtlCache                                        │
//! │                                                                         │
//! │  put_*(key, value) ──► Entry { value, expires_at = now + ttl }         │
//! │                                                                         │
//! │  get_*(key)                                                            │
//! │     ├── missing            → None                                      │
//! │     ├── now >= expires_at  → remove, None      (lazy expiry)           │
//! │     └── fresh              → Some(value.clone())                       │
//! │                                                                         │
//! │  janitor (every purge_interval) ──► purge_expired()                    │
//! │                                                                         │
//! │  Two DashMaps (sharded locks). No capacity bound.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Keys
//! - coupon lookups: the coupon code
//! - applicable sets: `applicable_<sha256(cart signature)>_<total>_<RFC 3339 nanos>`
//!
//! The total and instant are keyed exactly. A listing computed for one
//! total or instant is never served for another, so a hit cannot contain a
//! coupon that has expired or whose minimum exceeds the requested total.
//!
//! Entries may be stale for up to one TTL after the store changes.
//! Not-found lookups are never cached.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use coupon_core::cart::cart_digest;
use coupon_core::{CartItem, Coupon};

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default janitor period.
pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Cache used by the coupon service.
///
/// Implementations synchronize internally; callers never hold a lock
/// around these calls.
pub trait CouponCache: Send + Sync {
    fn get_coupon(&self, code: &str) -> Option<Coupon>;

    fn put_coupon(&self, coupon: Coupon);

    fn get_applicable(&self, key: &str) -> Option<Vec<Coupon>>;

    fn put_applicable(&self, key: String, coupons: Vec<Coupon>);

    /// Drops every expired entry and returns how many were removed.
    fn purge_expired(&self) -> usize;
}

/// Builds the cache key for an applicable-coupon listing.
///
/// The cart part is order independent. `order_total` is written with the
/// shortest round-trip `f64` form and `at` to the nanosecond.
pub fn applicable_key(items: &[CartItem], order_total: f64, at: DateTime<Utc>) -> String {
    format!(
        "applicable_{}_{}_{}",
        cart_digest(items),
        order_total,
        at.to_rfc3339_opts(SecondsFormat::Nanos, true)
    )
}

// =============================================================================
// TTL Cache
// =============================================================================

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Entry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Entry {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process [`CouponCache`] with a fixed time-to-live.
#[derive(Debug)]
pub struct TtlCache {
    ttl: Duration,
    coupons: DashMap<String, Entry<Coupon>>,
    applicable: DashMap<String, Entry<Vec<Coupon>>>,
}

impl Default for TtlCache {
    fn default() -> Self {
        TtlCache::new(DEFAULT_TTL)
    }
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            ttl,
            coupons: DashMap::new(),
            applicable: DashMap::new(),
        }
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.coupons.len() + self.applicable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawns a task that calls [`purge_expired`](CouponCache::purge_expired)
    /// every `every`. Abort the handle to stop it.
    pub fn spawn_janitor(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.purge_expired();
                if removed > 0 {
                    debug!(removed, "Purged expired cache entries");
                }
            }
        })
    }
}

fn lookup<T: Clone>(map: &DashMap<String, Entry<T>>, key: &str) -> Option<T> {
    let now = Instant::now();
    {
        let entry = map.get(key)?;
        if !entry.is_expired(now) {
            return Some(entry.value.clone());
        }
    }
    // Read guard is dropped before removing; another writer may have
    // refreshed the entry in between.
    map.remove_if(key, |_, entry| entry.is_expired(now));
    None
}

fn purge<T>(map: &DashMap<String, Entry<T>>, now: Instant) -> usize {
    let before = map.len();
    map.retain(|_, entry| !entry.is_expired(now));
    before.saturating_sub(map.len())
}

impl CouponCache for TtlCache {
    fn get_coupon(&self, code: &str) -> Option<Coupon> {
        lookup(&self.coupons, code)
    }

    fn put_coupon(&self, coupon: Coupon) {
        self.coupons
            .insert(coupon.code.clone(), Entry::new(coupon, self.ttl));
    }

    fn get_applicable(&self, key: &str) -> Option<Vec<Coupon>> {
        lookup(&self.applicable, key)
    }

    fn put_applicable(&self, key: String, coupons: Vec<Coupon>) {
        self.applicable.insert(key, Entry::new(coupons, self.ttl));
    }

    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        purge(&self.coupons, now) + purge(&self.applicable, now)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use coupon_core::{DiscountType, NewCoupon, UsageType};

    fn coupon(code: &str) -> Coupon {
        NewCoupon {
            code: code.into(),
            expiry_date: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            usage_type: UsageType::MultiUse,
            discount_type: DiscountType::Percentage,
            discount_value: 10.0,
            min_order_value: 100.0,
            applicable_medicine_ids: vec![],
            applicable_categories: vec![],
            valid_time_window: None,
            terms_and_conditions: String::new(),
            max_usage_per_user: 0,
            is_active: true,
        }
        .into_coupon(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
    }

    fn item(id: &str) -> CartItem {
        CartItem {
            id: id.into(),
            category: "vitamins".into(),
            price: 10.0,
            quantity: 1,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(300));
        let save10 = coupon("SAVE10");
        cache.put_coupon(save10.clone());

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get_coupon("SAVE10"), Some(save10));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get_coupon("SAVE10"), None);
        // Lazy expiry removed it
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_refreshes_expiry() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.put_coupon(coupon("SAVE10"));

        tokio::time::advance(Duration::from_secs(8)).await;
        cache.put_coupon(coupon("SAVE10"));

        tokio::time::advance(Duration::from_secs(8)).await;
        assert!(cache.get_coupon("SAVE10").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired_counts_both_maps() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.put_coupon(coupon("OLD"));
        cache.put_applicable("applicable_old".into(), vec![coupon("OLD")]);

        tokio::time::advance(Duration::from_secs(5)).await;
        cache.put_coupon(coupon("NEW"));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get_coupon("NEW").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_janitor_purges_in_background() {
        let cache = Arc::new(TtlCache::new(Duration::from_secs(60)));
        cache.put_coupon(coupon("SAVE10"));
        let janitor = cache.spawn_janitor(Duration::from_secs(600));

        tokio::time::sleep(Duration::from_secs(601)).await;
        assert!(cache.is_empty());

        janitor.abort();
    }

    #[test]
    fn test_applicable_key_is_cart_order_independent() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let a = applicable_key(&[item("med_1"), item("med_2")], 250.0, at);
        let b = applicable_key(&[item("med_2"), item("med_1")], 250.0, at);
        assert_eq!(a, b);
        assert!(a.starts_with("applicable_"));
        assert!(a.ends_with("_250_2025-03-01T12:00:00.000000000Z"));

        let other_cart = applicable_key(&[item("med_1")], 250.0, at);
        assert_ne!(a, other_cart);
    }

    #[test]
    fn test_applicable_key_is_exact_in_total_and_instant() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let base = applicable_key(&[], 100.0, at);

        assert_ne!(base, applicable_key(&[], 99.996, at));
        assert_ne!(base, applicable_key(&[], 100.004, at));
        assert_ne!(
            base,
            applicable_key(&[], 100.0, at + chrono::Duration::milliseconds(900))
        );
        assert_ne!(
            base,
            applicable_key(&[], 100.0, at + chrono::Duration::nanoseconds(1))
        );
        assert_eq!(base, applicable_key(&[], 100.0, at));
    }
}
