//! # coupon-core: Pure Business Logic for the Coupon Engine
//!
//! This crate is the **heart** of the coupon engine. It contains the data
//! model and the validation engine as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Coupon Engine Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    coupon-api (axum)                            │   │
//! │  │    POST /coupons ─ GET /coupons/applicable ─ POST /validate     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           coupon-service (cache + locks + orchestration)        │   │
//! │  └───────────────┬─────────────────────────────────┬───────────────┘   │
//! │                  │                                 │                    │
//! │  ┌───────────────▼─────────────────────────────┐   │                    │
//! │  │               ★ coupon-core (THIS CRATE) ★  │   │                    │
//! │  │                                             │   │                    │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────┐ ┌──────┐ │   │                    │
//! │  │   │  types  │ │ engine  │ │ cart │ │valid-│ │   │                    │
//! │  │   │ Coupon  │ │ checks  │ │ sig- │ │ation │ │   │                    │
//! │  │   │ Usage   │ │discount │ │nature│ │input │ │   │                    │
//! │  │   └─────────┘ └─────────┘ └──────┘ └──────┘ │   │                    │
//! │  │   NO I/O • NO DATABASE • NO CLOCK           │   │                    │
//! │  └─────────────────────────────────────────────┘   │                    │
//! │                                     ┌──────────────▼──────────────┐     │
//! │                                     │   coupon-db (SQLite)        │     │
//! │                                     └─────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Coupon, CartItem, ValidationContext, ...)
//! - [`engine`] - Ordered eligibility checks and discount computation
//! - [`cart`] - Order-independent cart signatures for cache keys
//! - [`validation`] - Input validation for create/validate requests
//! - [`error`] - Rejections and input errors
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output; callers pass the timestamp
//! 2. **No I/O**: the usage counter is queried by the caller between engine stages
//! 3. **Rejections Are Values**: a refused coupon is a normal outcome, not a fault

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod engine;
pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use coupon_core::Coupon` instead of
// `use coupon_core::types::Coupon`

pub use error::{Rejection, ValidationError};
pub use types::*;
