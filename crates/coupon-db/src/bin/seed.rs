//! # Seed Data Generator
//!
//! Populates the database with demo coupons for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./coupons.db (default)
//! cargo run -p coupon-db --bin seed
//!
//! # Specify database path
//! cargo run -p coupon-db --bin seed -- --db ./data/coupons.db
//! ```
//!
//! ## Generated Coupons
//! | Code        | Kind                                        |
//! |-------------|---------------------------------------------|
//! | `SAVE10`    | 10% off, min order 100, multi-use           |
//! | `FLAT50`    | 50 off, min order 300, multi-use            |
//! | `ONEUSE`    | 25 off, once per user                       |
//! | `HAPPYHOUR` | 15% off, time-based, today 09:00-17:00 UTC  |
//! | `ANTIBIO15` | 15% off antibiotics only                    |
//!
//! Existing codes are skipped, so the seed can be re-run safely.

use chrono::{DateTime, Duration, Utc};
use coupon_core::{DiscountType, NewCoupon, TimeWindow, UsageType};
use coupon_db::{Database, DbConfig, DbError};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| String::from("./coupons.db"));

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Coupon Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $DATABASE_PATH or ./coupons.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Coupon Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");
    println!();

    let now = Utc::now();
    let mut inserted = 0;

    for new in demo_coupons(now) {
        let code = new.code.clone();
        match db.coupons().insert(&new.into_coupon(now)).await {
            Ok(()) => {
                println!("  + {}", code);
                inserted += 1;
            }
            Err(DbError::UniqueViolation { .. }) => println!("  = {} (already present)", code),
            Err(e) => return Err(e.into()),
        }
    }

    println!();
    println!(
        "✓ Seed complete! {} inserted, {} total coupons",
        inserted,
        db.coupons().count().await?
    );

    Ok(())
}

/// Builds the demo coupon set relative to `now`.
fn demo_coupons(now: DateTime<Utc>) -> Vec<NewCoupon> {
    let in_a_year = now + Duration::days(365);
    let today = now.date_naive();
    let window = today
        .and_hms_opt(9, 0, 0)
        .zip(today.and_hms_opt(17, 0, 0))
        .map(|(start, end)| TimeWindow::new(start.and_utc(), end.and_utc()));

    let base = |code: &str, discount_type, discount_value| NewCoupon {
        code: code.to_string(),
        expiry_date: in_a_year,
        usage_type: UsageType::MultiUse,
        discount_type,
        discount_value,
        min_order_value: 0.0,
        applicable_medicine_ids: vec![],
        applicable_categories: vec![],
        valid_time_window: None,
        terms_and_conditions: String::new(),
        max_usage_per_user: 0,
        is_active: true,
    };

    vec![
        NewCoupon {
            min_order_value: 100.0,
            terms_and_conditions: "10% off orders of 100 or more".into(),
            ..base("SAVE10", DiscountType::Percentage, 10.0)
        },
        NewCoupon {
            min_order_value: 300.0,
            terms_and_conditions: "Flat 50 off orders of 300 or more".into(),
            ..base("FLAT50", DiscountType::Fixed, 50.0)
        },
        NewCoupon {
            usage_type: UsageType::OneTime,
            max_usage_per_user: 1,
            terms_and_conditions: "One redemption per customer".into(),
            ..base("ONEUSE", DiscountType::Fixed, 25.0)
        },
        NewCoupon {
            usage_type: UsageType::TimeBased,
            valid_time_window: window,
            terms_and_conditions: "Valid 09:00-17:00 UTC".into(),
            ..base("HAPPYHOUR", DiscountType::Percentage, 15.0)
        },
        NewCoupon {
            applicable_categories: vec!["antibiotics".into()],
            terms_and_conditions: "Antibiotics only".into(),
            ..base("ANTIBIO15", DiscountType::Percentage, 15.0)
        },
    ]
}
