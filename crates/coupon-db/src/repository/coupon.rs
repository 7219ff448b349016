//! # Coupon Repository
//!
//! Database operations for coupon definitions.
//!
//! ## Key Operations
//! - Insert with duplicate-code detection
//! - Lookup by code (active coupons only) and by id
//! - Applicability prefilter for the "which coupons can I use?" listing
//!
//! ## Applicability Prefilter
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │             get_applicable(order_total = 250, at = 2025-03-01)          │
//! │                                                                         │
//! │  coupons                                                                │
//! │  ┌──────────┬────────┬────────────┬─────────┐                           │
//! │  │ code     │ active │ expiry     │ min     │                           │
//! │  ├──────────┼────────┼────────────┼─────────┤                           │
//! │  │ SAVE10   │   1    │ 2026-01-01 │  100    │ ← kept                    │
//! │  │ EXPIRED1 │   1    │ 2024-01-01 │    0    │ ✗ expired                 │
//! │  │ BIGSPEND │   1    │ 2026-01-01 │  500    │ ✗ min not met             │
//! │  │ RETIRED  │   0    │ 2026-01-01 │    0    │ ✗ inactive                │
//! │  └──────────┴────────┴────────────┴─────────┘                           │
//! │                                                                         │
//! │  Cart applicability is NOT checked here; the service filters the rows  │
//! │  with the engine afterwards.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use super::{decode_timestamp, encode_timestamp};
use crate::error::{DbError, DbResult};
use coupon_core::{Coupon, DiscountType, TimeWindow, UsageType};

/// Column list shared by every SELECT in this module.
const COUPON_COLUMNS: &str = r#"
    id,
    code,
    expiry_date,
    usage_type,
    discount_type,
    discount_value,
    min_order_value,
    applicable_medicine_ids,
    applicable_categories,
    window_start,
    window_end,
    terms_and_conditions,
    max_usage_per_user,
    is_active,
    created_at,
    updated_at
"#;

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw `coupons` row.
#[derive(Debug, FromRow)]
struct CouponRow {
    id: String,
    code: String,
    expiry_date: String,
    usage_type: UsageType,
    discount_type: DiscountType,
    discount_value: f64,
    min_order_value: f64,
    applicable_medicine_ids: String,
    applicable_categories: String,
    window_start: Option<String>,
    window_end: Option<String>,
    terms_and_conditions: String,
    max_usage_per_user: i64,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = DbError;

    fn try_from(row: CouponRow) -> DbResult<Self> {
        let valid_time_window = match (row.window_start, row.window_end) {
            (Some(start), Some(end)) => Some(TimeWindow::new(
                decode_timestamp("window_start", &start)?,
                decode_timestamp("window_end", &end)?,
            )),
            (None, None) => None,
            // The schema CHECK forbids this
            _ => {
                return Err(DbError::corrupt(
                    "window_start",
                    "window bounds must both be set or both be null",
                ))
            }
        };

        Ok(Coupon {
            id: row.id,
            code: row.code,
            expiry_date: decode_timestamp("expiry_date", &row.expiry_date)?,
            usage_type: row.usage_type,
            discount_type: row.discount_type,
            discount_value: row.discount_value,
            min_order_value: row.min_order_value,
            applicable_medicine_ids: decode_list(
                "applicable_medicine_ids",
                &row.applicable_medicine_ids,
            )?,
            applicable_categories: decode_list(
                "applicable_categories",
                &row.applicable_categories,
            )?,
            valid_time_window,
            terms_and_conditions: row.terms_and_conditions,
            max_usage_per_user: row.max_usage_per_user,
            is_active: row.is_active,
            created_at: decode_timestamp("created_at", &row.created_at)?,
            updated_at: decode_timestamp("updated_at", &row.updated_at)?,
        })
    }
}

fn decode_list(column: &str, raw: &str) -> DbResult<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| DbError::corrupt(column, e))
}

fn encode_list(column: &str, list: &[String]) -> DbResult<String> {
    serde_json::to_string(list).map_err(|e| DbError::corrupt(column, e))
}

fn into_coupons(rows: Vec<CouponRow>) -> DbResult<Vec<Coupon>> {
    rows.into_iter().map(Coupon::try_from).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for coupon database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.coupons();
///
/// repo.insert(&coupon).await?;
/// let found = repo.get_by_code("SAVE10").await?;
/// let candidates = repo.get_applicable(250.0, Utc::now()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Inserts a new coupon.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation { field: "code", .. }` - code already taken
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        debug!(code = %coupon.code, id = %coupon.id, "Inserting coupon");

        let medicine_ids = encode_list("applicable_medicine_ids", &coupon.applicable_medicine_ids)?;
        let categories = encode_list("applicable_categories", &coupon.applicable_categories)?;
        let window_start = coupon
            .valid_time_window
            .as_ref()
            .map(|w| encode_timestamp(&w.start_time));
        let window_end = coupon
            .valid_time_window
            .as_ref()
            .map(|w| encode_timestamp(&w.end_time));

        let result = sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, expiry_date, usage_type, discount_type,
                discount_value, min_order_value,
                applicable_medicine_ids, applicable_categories,
                window_start, window_end, terms_and_conditions,
                max_usage_per_user, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(encode_timestamp(&coupon.expiry_date))
        .bind(coupon.usage_type)
        .bind(coupon.discount_type)
        .bind(coupon.discount_value)
        .bind(coupon.min_order_value)
        .bind(medicine_ids)
        .bind(categories)
        .bind(window_start)
        .bind(window_end)
        .bind(&coupon.terms_and_conditions)
        .bind(coupon.max_usage_per_user)
        .bind(coupon.is_active)
        .bind(encode_timestamp(&coupon.created_at))
        .bind(encode_timestamp(&coupon.updated_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match DbError::from(e) {
                // The sqlx mapping only knows the column, not the value
                DbError::UniqueViolation { field, .. } if field.ends_with("code") => {
                    Err(DbError::duplicate("code", &coupon.code))
                }
                other => Err(other),
            },
        }
    }

    /// Gets an active coupon by its code.
    ///
    /// ## Returns
    /// * `Ok(Some(Coupon))` - Active coupon found
    /// * `Ok(None)` - No such code, or the coupon is deactivated
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let sql = format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = ?1 AND is_active = 1"
        );
        let row = sqlx::query_as::<_, CouponRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Coupon::try_from).transpose()
    }

    /// Gets a coupon by id, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Coupon>> {
        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE id = ?1");
        let row = sqlx::query_as::<_, CouponRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Coupon::try_from).transpose()
    }

    /// Lists active, unexpired coupons whose minimum order value is met.
    ///
    /// Rows come back in creation order. Cart applicability is left to the
    /// caller.
    pub async fn get_applicable(
        &self,
        order_total: f64,
        at: DateTime<Utc>,
    ) -> DbResult<Vec<Coupon>> {
        let sql = format!(
            r#"
            SELECT {COUPON_COLUMNS}
            FROM coupons
            WHERE is_active = 1
            AND expiry_date > ?1
            AND min_order_value <= ?2
            ORDER BY created_at, rowid
            "#
        );
        let rows = sqlx::query_as::<_, CouponRow>(&sql)
            .bind(encode_timestamp(&at))
            .bind(order_total)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), order_total, "Applicable coupon prefilter");
        into_coupons(rows)
    }

    /// Activates or deactivates a coupon.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no coupon with this id
    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE coupons SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(is_active)
        .bind(encode_timestamp(&Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
        }

        debug!(id = %id, is_active, "Coupon activation changed");
        Ok(())
    }

    /// Counts all coupons, active or not.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coupons")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use coupon_core::NewCoupon;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    fn coupon(code: &str, min_order_value: f64, expiry_date: DateTime<Utc>) -> Coupon {
        NewCoupon {
            code: code.into(),
            expiry_date,
            usage_type: UsageType::MultiUse,
            discount_type: DiscountType::Percentage,
            discount_value: 10.0,
            min_order_value,
            applicable_medicine_ids: vec![],
            applicable_categories: vec![],
            valid_time_window: None,
            terms_and_conditions: String::new(),
            max_usage_per_user: 0,
            is_active: true,
        }
        .into_coupon(at(1, 0))
    }

    async fn repo() -> CouponRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().coupons()
    }

    #[tokio::test]
    async fn test_insert_and_get_by_code_round_trip() {
        let repo = repo().await;

        let mut happy = coupon("HAPPYHOUR", 0.0, at(30, 0));
        happy.usage_type = UsageType::TimeBased;
        happy.discount_type = DiscountType::Fixed;
        happy.discount_value = 50.0;
        happy.applicable_categories = vec!["antibiotics".into(), "vitamins".into()];
        happy.applicable_medicine_ids = vec!["med_123".into()];
        happy.valid_time_window = Some(TimeWindow::new(at(2, 9), at(2, 17)));
        happy.terms_and_conditions = "Weekdays only".into();

        repo.insert(&happy).await.unwrap();

        let found = repo.get_by_code("HAPPYHOUR").await.unwrap().unwrap();
        assert_eq!(found, happy);
        assert_eq!(repo.get_by_id(&happy.id).await.unwrap(), Some(happy));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_by_code_missing_is_none() {
        let repo = repo().await;
        assert!(repo.get_by_code("NOPE").await.unwrap().is_none());
        assert!(repo.get_by_id("no-such-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_is_unique_violation() {
        let repo = repo().await;
        repo.insert(&coupon("SAVE10", 100.0, at(30, 0))).await.unwrap();

        let err = repo
            .insert(&coupon("SAVE10", 0.0, at(30, 0)))
            .await
            .unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "code");
                assert_eq!(value, "SAVE10");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_inactive_coupon_is_hidden_from_code_lookup() {
        let repo = repo().await;
        let save10 = coupon("SAVE10", 100.0, at(30, 0));
        repo.insert(&save10).await.unwrap();

        repo.set_active(&save10.id, false).await.unwrap();
        assert!(repo.get_by_code("SAVE10").await.unwrap().is_none());

        let by_id = repo.get_by_id(&save10.id).await.unwrap().unwrap();
        assert!(!by_id.is_active);

        repo.set_active(&save10.id, true).await.unwrap();
        assert!(repo.get_by_code("SAVE10").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_set_active_unknown_id_is_not_found() {
        let repo = repo().await;
        let err = repo.set_active("missing", false).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_applicable_prefilter() {
        let repo = repo().await;
        let now = at(15, 12);

        let save10 = coupon("SAVE10", 100.0, at(30, 0));
        let expired = coupon("EXPIRED1", 0.0, at(10, 0));
        let big = coupon("BIGSPEND", 500.0, at(30, 0));
        let retired = coupon("RETIRED", 0.0, at(30, 0));
        let exact_min = coupon("EXACTMIN", 250.0, at(30, 0));
        let expires_now = coupon("EXPIRESNOW", 0.0, now);

        for c in [&save10, &expired, &big, &retired, &exact_min, &expires_now] {
            repo.insert(c).await.unwrap();
        }
        repo.set_active(&retired.id, false).await.unwrap();

        let codes: Vec<String> = repo
            .get_applicable(250.0, now)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.code)
            .collect();

        assert_eq!(codes, vec!["SAVE10".to_string(), "EXACTMIN".to_string()]);
    }

    #[tokio::test]
    async fn test_get_applicable_keeps_creation_order() {
        let repo = repo().await;

        let mut later = coupon("LATER", 0.0, at(30, 0));
        later.created_at = at(5, 0);
        let mut earlier = coupon("EARLIER", 0.0, at(30, 0));
        earlier.created_at = at(5, 0) - Duration::milliseconds(1);

        repo.insert(&later).await.unwrap();
        repo.insert(&earlier).await.unwrap();

        let codes: Vec<String> = repo
            .get_applicable(10.0, at(6, 0))
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.code)
            .collect();
        assert_eq!(codes, vec!["EARLIER".to_string(), "LATER".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_list_column_is_reported() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.coupons();
        repo.insert(&coupon("SAVE10", 0.0, at(30, 0))).await.unwrap();

        sqlx::query("UPDATE coupons SET applicable_categories = 'not json'")
            .execute(db.pool())
            .await
            .unwrap();

        let err = repo.get_by_code("SAVE10").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::CorruptColumn { ref column, .. } if column == "applicable_categories"
        ));
    }
}
