//! # Repository Module
//!
//! Database repository implementations for the coupon store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  CouponService (coupon-service)                                        │
//! │       │                                                                 │
//! │       │  db.coupons().get_by_code("SAVE10")                            │
//! │       ▼                                                                 │
//! │  CouponRepository                 UsageRepository                      │
//! │  ├── insert                       ├── record                           │
//! │  ├── get_by_code / get_by_id      ├── count_for_user                   │
//! │  ├── get_applicable               └── list_for_coupon                  │
//! │  ├── set_active                                                        │
//! │  └── count                                                             │
//! │       │                                  │                              │
//! │       ▼                                  ▼                              │
//! │  coupons table  ◄──── FK ────  coupon_usages table                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Timestamps
//! All instants are written as fixed-width RFC 3339 UTC strings with
//! nanosecond precision, so `<`/`>` in SQL compare chronologically.
//!
//! ## Available Repositories
//!
//! - [`CouponRepository`](coupon::CouponRepository) - Coupon CRUD and applicability prefilter
//! - [`UsageRepository`](usage::UsageRepository) - Append-only usage records

pub mod coupon;
pub mod usage;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{DbError, DbResult};

/// Formats an instant the way every timestamp column stores it.
pub(crate) fn encode_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parses a stored timestamp column.
pub(crate) fn decode_timestamp(column: &str, raw: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::corrupt(column, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_timestamp_round_trip_keeps_nanos() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap() + Duration::nanoseconds(7);
        let raw = encode_timestamp(&at);
        assert_eq!(raw, "2025-03-01T09:30:00.000000007Z");
        assert_eq!(decode_timestamp("t", &raw).unwrap(), at);
    }

    #[test]
    fn test_encoded_timestamps_sort_chronologically() {
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let earlier = encode_timestamp(&base);
        let later = encode_timestamp(&(base + Duration::milliseconds(500)));
        let much_later = encode_timestamp(&(base + Duration::hours(3)));
        assert!(earlier < later);
        assert!(later < much_later);
    }

    #[test]
    fn test_bad_timestamp_is_corrupt_column() {
        let err = decode_timestamp("expiry_date", "yesterday").unwrap_err();
        assert!(matches!(err, DbError::CorruptColumn { ref column, .. } if column == "expiry_date"));
    }
}
