//! # Coupon API
//!
//! axum HTTP layer over [`coupon_service::CouponService`].
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP JSON ──► routes::coupons handler                                 │
//! │                   │  bind body (JsonRejection → 400)                   │
//! │                   ▼                                                     │
//! │               CouponService  ──► ServiceError → ApiError (400/409/500) │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │               JSON response (rejections are 200, is_valid = false)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use coupon_db::Database;
use coupon_service::{CouponService, TtlCache};

pub use config::ApiConfig;
pub use error::{ApiError, ErrorCode};
pub use routes::router;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<CouponService>,
}

impl AppState {
    pub fn new(service: CouponService) -> Self {
        AppState {
            service: Arc::new(service),
        }
    }

    /// Wires a SQLite-backed service with a fresh cache.
    pub fn with_database(db: Database, cache: Arc<TtlCache>) -> Self {
        AppState::new(CouponService::new(Arc::new(db), cache))
    }

    /// Same as [`with_database`](Self::with_database) with a new cache of
    /// lifetime `ttl`.
    pub fn with_database_ttl(db: Database, ttl: Duration) -> Self {
        Self::with_database(db, Arc::new(TtlCache::new(ttl)))
    }
}
