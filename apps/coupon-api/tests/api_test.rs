//! HTTP-level tests: the full router driven with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use coupon_api::{router, AppState};
use coupon_db::{Database, DbConfig, DbError};
use coupon_service::{CouponService, MockCouponStore, TtlCache};

// =============================================================================
// Helpers
// =============================================================================

async fn app() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    router(AppState::with_database(db, Arc::new(TtlCache::default())))
}

fn mock_app(store: MockCouponStore) -> Router {
    router(AppState::new(CouponService::new(
        Arc::new(store),
        Arc::new(TtlCache::default()),
    )))
}

async fn send(app: &Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    send_raw(app, method, uri, body.to_string()).await
}

async fn send_raw(app: &Router, method: Method, uri: &str, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn coupon_body(code: &str) -> Value {
    json!({
        "code": code,
        "expiry_date": "2099-12-31T23:59:59Z",
        "usage_type": "multi_use",
        "discount_type": "percentage",
        "discount_value": 10.0,
        "min_order_value": 100.0
    })
}

async fn create(app: &Router, body: Value) -> Value {
    let (status, created) = send(app, Method::POST, "/api/v1/coupons", body).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    created
}

fn validate_body(code: &str, user_id: &str, cart_items: Value, order_total: f64) -> Value {
    json!({
        "coupon_code": code,
        "cart_items": cart_items,
        "order_total": order_total,
        "timestamp": "2025-06-15T12:00:00Z",
        "user_id": user_id
    })
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_health_unavailable_when_store_is_down() {
    let mut store = MockCouponStore::new();
    store.expect_health_check().returning(|| false);
    let app = mock_app(store);

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"UNAVAILABLE");
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_then_duplicate_conflicts() {
    let app = app().await;

    let created = create(&app, coupon_body("SAVE10")).await;
    assert_eq!(created["code"], "SAVE10");
    assert_eq!(created["is_active"], true);
    assert!(created["id"].as_str().is_some_and(|id| !id.is_empty()));

    let (status, body) = send(&app, Method::POST, "/api/v1/coupons", coupon_body("SAVE10")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_CODE");
    assert_eq!(body["message"], "coupon code 'SAVE10' already exists");
}

#[tokio::test]
async fn test_create_rejects_invalid_payload() {
    let app = app().await;

    let mut body = coupon_body("TOO_MUCH");
    body["discount_value"] = json!(150.0);

    let (status, body) = send(&app, Method::POST, "/api/v1/coupons", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["message"], "discount_value must be between 0 and 100");
}

#[tokio::test]
async fn test_malformed_json_is_invalid_request() {
    let app = app().await;

    let (status, body) =
        send_raw(&app, Method::POST, "/api/v1/coupons", "{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");

    // Unknown enum value
    let mut payload = coupon_body("BAD");
    payload["usage_type"] = json!("sometimes");
    let (status, body) = send(&app, Method::POST, "/api/v1/coupons", payload).await;
    assert!(status.is_client_error());
    assert_eq!(body["code"], "INVALID_REQUEST");
}

// =============================================================================
// Validate
// =============================================================================

#[tokio::test]
async fn test_validate_applies_percentage() {
    let app = app().await;
    create(&app, coupon_body("SAVE10")).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/coupons/validate",
        validate_body("SAVE10", "U1", json!([]), 200.0),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_valid"], true);
    assert_eq!(body["discount"]["items_discount"], 20.0);
    assert_eq!(body["discount"]["charges_discount"], 0.0);
    assert_eq!(body["message"], "coupon applied successfully");
    assert!(body.get("reason").is_none());
}

#[tokio::test]
async fn test_rejections_are_ok_responses() {
    let app = app().await;

    let mut expired = coupon_body("EXPIRED1");
    expired["expiry_date"] = json!("2020-01-01T00:00:00Z");
    create(&app, expired).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/coupons/validate",
        validate_body("EXPIRED1", "U1", json!([]), 200.0),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_valid"], false);
    assert_eq!(body["reason"], "coupon has expired");
    assert!(body.get("discount").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/coupons/validate",
        validate_body("NOPE", "U1", json!([]), 200.0),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reason"], "coupon not found");
}

#[tokio::test]
async fn test_one_time_coupon_second_use() {
    let app = app().await;
    create(
        &app,
        json!({
            "code": "ONEUSE",
            "expiry_date": "2099-12-31T23:59:59Z",
            "usage_type": "one_time",
            "discount_type": "fixed",
            "discount_value": 25.0,
            "max_usage_per_user": 1
        }),
    )
    .await;

    let first = validate_body("ONEUSE", "U1", json!([]), 80.0);
    let (_, body) = send(&app, Method::POST, "/api/v1/coupons/validate", first.clone()).await;
    assert_eq!(body["is_valid"], true);
    assert_eq!(body["discount"]["items_discount"], 25.0);

    let (status, body) = send(&app, Method::POST, "/api/v1/coupons/validate", first).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_valid"], false);
    assert_eq!(body["reason"], "maximum usage per user exceeded");

    // Another user is unaffected
    let (_, body) = send(
        &app,
        Method::POST,
        "/api/v1/coupons/validate",
        validate_body("ONEUSE", "U2", json!([]), 80.0),
    )
    .await;
    assert_eq!(body["is_valid"], true);
}

#[tokio::test]
async fn test_validate_rejects_blank_user() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/coupons/validate",
        validate_body("SAVE10", "  ", json!([]), 200.0),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["message"], "user_id is required");
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let mut store = MockCouponStore::new();
    store
        .expect_get_by_code()
        .returning(|_| Err(DbError::PoolExhausted));
    store.expect_record_usage().never();
    let app = mock_app(store);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/coupons/validate",
        validate_body("SAVE10", "U1", json!([]), 200.0),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert_eq!(body["message"], "internal server error");
}

// =============================================================================
// Applicable
// =============================================================================

#[tokio::test]
async fn test_applicable_via_get_and_post() {
    let app = app().await;
    create(&app, coupon_body("SAVE10")).await;

    let mut antibiotics = coupon_body("ANTIBIO15");
    antibiotics["discount_value"] = json!(15.0);
    antibiotics["min_order_value"] = json!(0.0);
    antibiotics["applicable_categories"] = json!(["antibiotics"]);
    create(&app, antibiotics).await;

    let request = json!({
        "cart_items": [{"id": "med_1", "category": "vitamins", "price": 150.0, "quantity": 1}],
        "order_total": 150.0,
        "timestamp": "2025-06-15T12:00:00Z"
    });

    for method in [Method::GET, Method::POST] {
        let (status, body) =
            send(&app, method, "/api/v1/coupons/applicable", request.clone()).await;
        assert_eq!(status, StatusCode::OK);

        let codes: Vec<&str> = body["applicable_coupons"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["code"].as_str().unwrap())
            .collect();
        assert_eq!(codes, vec!["SAVE10"]);
    }
}

#[tokio::test]
async fn test_applicable_rejects_negative_total() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/coupons/applicable",
        json!({"cart_items": [], "order_total": -1.0}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}
