//! # coupon-service: Coupon Orchestration
//!
//! Answers the three coupon questions (create, list applicable, validate)
//! by composing the store, a lookup cache and the pure engine.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  coupon-api handlers                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 coupon-service (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   CouponService ──► KeyedLocks (one critical section per code)  │   │
//! │  │        │                                                        │   │
//! │  │        ├──► dyn CouponCache (TtlCache)                          │   │
//! │  │        ├──► coupon_core::engine                                 │   │
//! │  │        └──► dyn CouponStore ──► coupon_db::Database             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`service`] - The orchestrator
//! - [`store`] - `CouponStore` trait and its `Database` implementation
//! - [`cache`] - `CouponCache` trait and the TTL implementation
//! - [`locks`] - Per-key async mutexes
//! - [`error`] - `ServiceError`

pub mod cache;
pub mod error;
pub mod locks;
pub mod service;
pub mod store;

pub use cache::{CouponCache, TtlCache};
pub use error::{ServiceError, ServiceResult};
pub use service::CouponService;
pub use store::{CouponStore, MockCouponStore};
