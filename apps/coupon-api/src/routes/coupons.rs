//! Coupon handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use tracing::debug;

use coupon_core::{Coupon, NewCoupon, ValidationResponse};

use crate::dto::{ApplicableRequest, ApplicableResponse, ValidateRequest};
use crate::error::ApiResult;
use crate::AppState;

/// `POST /api/v1/coupons`
pub async fn create_coupon(
    State(state): State<AppState>,
    payload: Result<Json<NewCoupon>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Coupon>)> {
    let Json(new) = payload?;
    let coupon = state.service.create_coupon(new).await?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

/// `GET|POST /api/v1/coupons/applicable`
pub async fn applicable_coupons(
    State(state): State<AppState>,
    payload: Result<Json<ApplicableRequest>, JsonRejection>,
) -> ApiResult<Json<ApplicableResponse>> {
    let Json(req) = payload?;
    let at = req.timestamp.unwrap_or_else(Utc::now);

    let applicable_coupons = state
        .service
        .get_applicable_coupons(&req.cart_items, req.order_total, at)
        .await?;

    Ok(Json(ApplicableResponse { applicable_coupons }))
}

/// `POST /api/v1/coupons/validate`
pub async fn validate_coupon(
    State(state): State<AppState>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> ApiResult<Json<ValidationResponse>> {
    let Json(req) = payload?;
    let ctx = req.into_context(Utc::now());
    debug!(code = %ctx.coupon_code, user_id = %ctx.user_id, "Validate request");

    let response = state.service.validate_coupon(&ctx).await?;
    Ok(Json(response))
}
