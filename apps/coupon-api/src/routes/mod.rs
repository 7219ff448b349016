//! Route table.
//!
//! ```text
//! POST     /api/v1/coupons             create_coupon
//! GET|POST /api/v1/coupons/applicable  applicable_coupons
//! POST     /api/v1/coupons/validate    validate_coupon
//! GET      /health                     health (503 when the store is down)
//! ```

pub mod coupons;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;

use crate::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/coupons", post(coupons::create_coupon))
        .route(
            "/api/v1/coupons/applicable",
            get(coupons::applicable_coupons).post(coupons::applicable_coupons),
        )
        .route("/api/v1/coupons/validate", post(coupons::validate_coupon))
        .route("/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.service.is_healthy().await {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE")
    }
}
