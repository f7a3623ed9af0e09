// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for ordo-core PostgreSQL tests.
//!
//! Tests run against the database in `TEST_DATABASE_URL` and are skipped when it
//! is not set.

#![allow(dead_code)]

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use ordo_core::persistence::{CalendarStore, PostgresStore};

/// Connect to the test database and run migrations.
pub async fn postgres_store() -> Option<Arc<PostgresStore>> {
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&database_url)
        .await
        .ok()?;
    ordo_core::migrations::run_postgres(&pool).await.ok()?;
    Some(Arc::new(PostgresStore::new(pool)))
}

/// A year no other test run is likely to use, so tests can share a database.
pub fn scratch_year() -> i32 {
    3000 + (uuid::Uuid::new_v4().as_u128() % 5000) as i32
}

/// Remove everything a test wrote for a year.
pub async fn cleanup(store: &dyn CalendarStore, year: i32) {
    let (start, end) = ordo_core::dates::year_bounds(year).expect("valid year");
    for locale in ordo_core::Locale::ALL {
        let _ = store
            .delete_days(locale, start, end, ordo_core::persistence::DeleteScope::All)
            .await;
    }
}

#[macro_export]
macro_rules! skip_if_no_db {
    () => {
        if std::env::var("TEST_DATABASE_URL").is_err() {
            eprintln!("Skipping test: TEST_DATABASE_URL not set");
            return;
        }
    };
}
