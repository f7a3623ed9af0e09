// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Persistence interfaces and backends for ordo-core.
//!
//! This module defines the store abstraction used by the regenerator and the
//! cache-only reader, plus PostgreSQL and SQLite implementations.

pub mod postgres;
pub mod sqlite;

pub use self::postgres::PostgresStore;
pub use self::sqlite::SqliteStore;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::compute::{Celebration, DayRecord};
use crate::config::DatabaseConfig;
use crate::cycle::YearCycles;
use crate::error::OrdoError;
use crate::locale::Locale;

/// Year-level metadata row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LiturgicalYearRecord {
    /// Database primary key, referenced by day rows.
    pub id: i64,
    /// Calendar year.
    pub year: i32,
    /// Locale code.
    pub locale: String,
    /// Sunday cycle label (A, B or C).
    pub lectionary_cycle: String,
    /// Weekday cycle (1 or 2).
    pub ferial_cycle: i32,
    /// Whether the year's days were produced by the regenerator.
    pub is_generated: bool,
    /// Last upsert time.
    pub updated_at: DateTime<Utc>,
}

/// Stored calendar day row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CalendarDayRecord {
    /// Database primary key.
    pub id: i64,
    /// Calendar date.
    pub date: NaiveDate,
    /// Locale code.
    pub locale: String,
    /// Owning year row, if known.
    pub liturgical_year_id: Option<i64>,
    /// Liturgical season name.
    pub season: String,
    /// Week index within the season.
    pub season_week: i32,
    /// Weekday name.
    pub weekday: String,
    /// Primary celebration title (may be empty).
    pub primary_title: String,
    /// Primary celebration rank.
    pub primary_rank: String,
    /// Primary celebration precedence.
    pub primary_rank_priority: i32,
    /// Primary celebration colour.
    pub primary_colour: String,
    /// Alternative celebration title.
    pub alternative_title: Option<String>,
    /// Alternative celebration rank.
    pub alternative_rank: Option<String>,
    /// Alternative celebration precedence.
    pub alternative_rank_priority: Option<i32>,
    /// Alternative celebration colour.
    pub alternative_colour: Option<String>,
    /// Producer tag (see [`DaySource`]).
    pub source: String,
    /// Whether the row was edited by hand.
    pub is_custom_edit: bool,
    /// When the row was written.
    pub created_at: DateTime<Utc>,
}

impl CalendarDayRecord {
    /// The primary celebration as stored.
    pub fn primary(&self) -> Celebration {
        Celebration {
            title: self.primary_title.clone(),
            rank: self.primary_rank.clone(),
            rank_priority: self.primary_rank_priority,
            colour: self.primary_colour.clone(),
        }
    }

    /// The alternative celebration, if one was stored.
    pub fn alternative(&self) -> Option<Celebration> {
        self.alternative_title.as_ref().map(|title| Celebration {
            title: title.clone(),
            rank: self.alternative_rank.clone().unwrap_or_default(),
            rank_priority: self.alternative_rank_priority.unwrap_or_default(),
            colour: self.alternative_colour.clone().unwrap_or_default(),
        })
    }
}

/// Producer of a calendar day row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySource {
    /// Written by the regenerator from engine output.
    PregeneratedEngine,
    /// Edited by hand outside this crate.
    CustomEdit,
}

impl DaySource {
    /// Stored tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PregeneratedEngine => "pregenerated-engine",
            Self::CustomEdit => "custom-edit",
        }
    }
}

/// A calendar day row to insert.
#[derive(Debug, Clone)]
pub struct NewCalendarDay {
    /// Calendar date.
    pub date: NaiveDate,
    /// Locale.
    pub locale: Locale,
    /// Owning year row.
    pub liturgical_year_id: Option<i64>,
    /// Liturgical season name.
    pub season: String,
    /// Week index within the season.
    pub season_week: i32,
    /// Weekday name.
    pub weekday: String,
    /// Primary celebration; empty title when the engine returned none.
    pub primary: Celebration,
    /// Alternative celebration.
    pub alternative: Option<Celebration>,
    /// Producer tag.
    pub source: DaySource,
    /// Whether the row was edited by hand.
    pub is_custom_edit: bool,
}

impl NewCalendarDay {
    /// Map an engine record to a generated row. Celebrations past the second are dropped.
    pub fn generated(record: DayRecord, locale: Locale, liturgical_year_id: i64) -> Self {
        let mut celebrations = record.celebrations.into_iter();
        let primary = celebrations.next().unwrap_or(Celebration {
            title: String::new(),
            rank: String::new(),
            rank_priority: 0,
            colour: String::new(),
        });
        let alternative = celebrations.next();

        Self {
            date: record.date,
            locale,
            liturgical_year_id: Some(liturgical_year_id),
            season: record.season,
            season_week: record.season_week,
            weekday: record.weekday,
            primary,
            alternative,
            source: DaySource::PregeneratedEngine,
            is_custom_edit: false,
        }
    }
}

/// Which rows a range delete removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteScope {
    /// Every row in the range.
    All,
    /// Only rows without a custom edit.
    GeneratedOnly,
}

/// Store interface used by the regenerator and the cache-only reader.
#[allow(missing_docs)]
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Backend name, for logs.
    fn backend(&self) -> &'static str;

    /// Insert or update the year row for (locale, year) and return its id.
    async fn upsert_liturgical_year(
        &self,
        locale: Locale,
        cycles: &YearCycles,
        is_generated: bool,
    ) -> Result<i64, OrdoError>;

    async fn get_liturgical_year(
        &self,
        locale: Locale,
        year: i32,
    ) -> Result<Option<LiturgicalYearRecord>, OrdoError>;

    /// List year rows ordered by year then locale.
    async fn list_liturgical_years(
        &self,
        locale: Option<Locale>,
    ) -> Result<Vec<LiturgicalYearRecord>, OrdoError>;

    /// Delete day rows for `locale` with `start <= date <= end`; returns rows removed.
    async fn delete_days(
        &self,
        locale: Locale,
        start: NaiveDate,
        end: NaiveDate,
        scope: DeleteScope,
    ) -> Result<u64, OrdoError>;

    /// Insert rows in a single statement; returns rows inserted.
    async fn insert_days(&self, days: &[NewCalendarDay]) -> Result<u64, OrdoError>;

    async fn get_day(
        &self,
        locale: Locale,
        date: NaiveDate,
    ) -> Result<Option<CalendarDayRecord>, OrdoError>;

    /// Rows for `locale` in `[start, end]`, ordered by date.
    async fn list_days(
        &self,
        locale: Locale,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CalendarDayRecord>, OrdoError>;

    async fn count_days(
        &self,
        locale: Locale,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, OrdoError>;

    /// Dates in `[start, end]` holding a custom-edited row.
    async fn list_custom_edit_dates(
        &self,
        locale: Locale,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, OrdoError>;

    /// Take the regeneration lease for (locale, year).
    ///
    /// Succeeds when no lease exists, the existing lease has expired, or `holder`
    /// already owns it. Returns false when another holder owns a live lease.
    async fn acquire_lease(
        &self,
        locale: Locale,
        year: i32,
        holder: &str,
        ttl: Duration,
    ) -> Result<bool, OrdoError>;

    /// Release the lease if `holder` owns it.
    async fn release_lease(&self, locale: Locale, year: i32, holder: &str)
    -> Result<(), OrdoError>;

    async fn health_check_db(&self) -> Result<bool, OrdoError>;

    /// Close the underlying pool.
    async fn close(&self);
}

/// Connect to the configured database, run migrations and return the store.
///
/// `sqlite:` URLs select [`SqliteStore`] (the file is created if missing),
/// `postgres://` and `postgresql://` URLs select [`PostgresStore`].
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn CalendarStore>, OrdoError> {
    let url = config.database_url.as_str();

    if url.starts_with("sqlite:") {
        let store = SqliteStore::connect(url, config.max_connections).await?;
        info!(backend = "sqlite", "Database connection established");
        Ok(Arc::new(store))
    } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await
            .map_err(|e| OrdoError::store("connect", e))?;
        crate::migrations::run_postgres(&pool).await?;
        info!(backend = "postgres", "Database connection established");
        Ok(Arc::new(PostgresStore::new(pool)))
    } else {
        Err(OrdoError::validation(
            "ORDO_DATABASE_URL",
            "must start with sqlite:, postgres:// or postgresql://",
        ))
    }
}
