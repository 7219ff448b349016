//! # Usage Repository
//!
//! Append-only redemption records. One row per successful validation.

use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use super::{decode_timestamp, encode_timestamp};
use crate::error::DbResult;
use coupon_core::CouponUsage;

#[derive(Debug, FromRow)]
struct UsageRow {
    id: String,
    coupon_id: String,
    user_id: String,
    used_at: String,
}

impl TryFrom<UsageRow> for CouponUsage {
    type Error = crate::error::DbError;

    fn try_from(row: UsageRow) -> DbResult<Self> {
        Ok(CouponUsage {
            id: row.id,
            coupon_id: row.coupon_id,
            user_id: row.user_id,
            used_at: decode_timestamp("used_at", &row.used_at)?,
        })
    }
}

/// Repository for coupon usage records.
#[derive(Debug, Clone)]
pub struct UsageRepository {
    pool: SqlitePool,
}

impl UsageRepository {
    /// Creates a new UsageRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UsageRepository { pool }
    }

    /// Records one redemption.
    ///
    /// ## Errors
    /// * `DbError::ForeignKeyViolation` - `coupon_id` doesn't exist
    pub async fn record(&self, usage: &CouponUsage) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO coupon_usages (id, coupon_id, user_id, used_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&usage.id)
        .bind(&usage.coupon_id)
        .bind(&usage.user_id)
        .bind(encode_timestamp(&usage.used_at))
        .execute(&self.pool)
        .await?;

        debug!(
            coupon_id = %usage.coupon_id,
            user_id = %usage.user_id,
            "Usage recorded"
        );
        Ok(())
    }

    /// Counts how many times `user_id` has redeemed `coupon_id`.
    pub async fn count_for_user(&self, coupon_id: &str, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM coupon_usages WHERE coupon_id = ?1 AND user_id = ?2",
        )
        .bind(coupon_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Lists every redemption of a coupon, oldest first.
    pub async fn list_for_coupon(&self, coupon_id: &str) -> DbResult<Vec<CouponUsage>> {
        let rows = sqlx::query_as::<_, UsageRow>(
            r#"
            SELECT id, coupon_id, user_id, used_at
            FROM coupon_usages
            WHERE coupon_id = ?1
            ORDER BY used_at, rowid
            "#,
        )
        .bind(coupon_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CouponUsage::try_from).collect()
    }
}
