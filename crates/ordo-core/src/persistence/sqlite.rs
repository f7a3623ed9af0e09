// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! SQLite-backed calendar store.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::warn;

use crate::cycle::YearCycles;
use crate::error::OrdoError;
use crate::locale::Locale;

use super::{
    CalendarDayRecord, CalendarStore, DeleteScope, LiturgicalYearRecord, NewCalendarDay,
};

const DAY_COLUMNS: &str = r#"
    id, date, locale, liturgical_year_id, season, season_week, weekday,
    primary_title, primary_rank, primary_rank_priority, primary_colour,
    alternative_title, alternative_rank, alternative_rank_priority, alternative_colour,
    source, is_custom_edit, created_at
"#;

/// SQLite-backed calendar store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store from an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a `sqlite:` URL and run all migrations.
    ///
    /// The database file and its parent directories are created if needed.
    /// `sqlite::memory:` is limited to one connection, since every connection
    /// to it is a separate database.
    ///
    /// ```ignore
    /// let store = SqliteStore::connect("sqlite:.data/ordo.db", 5).await?;
    /// ```
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, OrdoError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| OrdoError::store("connect", e))?
            .create_if_missing(true);

        let in_memory = url.contains(":memory:");
        if !in_memory
            && let Some(parent) = options.get_filename().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                OrdoError::store(
                    "create_dir",
                    format!("Failed to create directory {:?}: {}", parent, e),
                )
            })?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { max_connections })
            .connect_with(options)
            .await
            .map_err(|e| OrdoError::store("connect", e))?;

        crate::migrations::run_sqlite(&pool).await?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl CalendarStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn upsert_liturgical_year(
        &self,
        locale: Locale,
        cycles: &YearCycles,
        is_generated: bool,
    ) -> Result<i64, OrdoError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO liturgical_years (year, locale, lectionary_cycle, ferial_cycle, is_generated, updated_at)
            VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT (year, locale) DO UPDATE SET
                lectionary_cycle = excluded.lectionary_cycle,
                ferial_cycle = excluded.ferial_cycle,
                is_generated = excluded.is_generated,
                updated_at = CURRENT_TIMESTAMP
            RETURNING id
            "#,
        )
        .bind(cycles.year)
        .bind(locale.code())
        .bind(cycles.lectionary.as_str())
        .bind(cycles.ferial.as_u8() as i32)
        .bind(is_generated)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get_liturgical_year(
        &self,
        locale: Locale,
        year: i32,
    ) -> Result<Option<LiturgicalYearRecord>, OrdoError> {
        let record = sqlx::query_as::<_, LiturgicalYearRecord>(
            r#"
            SELECT id, year, locale, lectionary_cycle, ferial_cycle, is_generated, updated_at
            FROM liturgical_years
            WHERE year = ? AND locale = ?
            "#,
        )
        .bind(year)
        .bind(locale.code())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_liturgical_years(
        &self,
        locale: Option<Locale>,
    ) -> Result<Vec<LiturgicalYearRecord>, OrdoError> {
        let records = sqlx::query_as::<_, LiturgicalYearRecord>(
            r#"
            SELECT id, year, locale, lectionary_cycle, ferial_cycle, is_generated, updated_at
            FROM liturgical_years
            WHERE (? IS NULL OR locale = ?)
            ORDER BY year, locale
            "#,
        )
        .bind(locale.map(|l| l.code()))
        .bind(locale.map(|l| l.code()))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn delete_days(
        &self,
        locale: Locale,
        start: NaiveDate,
        end: NaiveDate,
        scope: DeleteScope,
    ) -> Result<u64, OrdoError> {
        let sql = match scope {
            DeleteScope::All => {
                "DELETE FROM calendar_days WHERE locale = ? AND date >= ? AND date <= ?"
            }
            DeleteScope::GeneratedOnly => {
                "DELETE FROM calendar_days WHERE locale = ? AND date >= ? AND date <= ? AND is_custom_edit = 0"
            }
        };

        let result = sqlx::query(sql)
            .bind(locale.code())
            .bind(start)
            .bind(end)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert_days(&self, days: &[NewCalendarDay]) -> Result<u64, OrdoError> {
        if days.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            INSERT INTO calendar_days (
                date, locale, liturgical_year_id, season, season_week, weekday,
                primary_title, primary_rank, primary_rank_priority, primary_colour,
                alternative_title, alternative_rank, alternative_rank_priority, alternative_colour,
                source, is_custom_edit
            )
            "#,
        );
        builder.push_values(days, |mut row, day| {
            let alternative = day.alternative.as_ref();
            row.push_bind(day.date)
                .push_bind(day.locale.code())
                .push_bind(day.liturgical_year_id)
                .push_bind(day.season.as_str())
                .push_bind(day.season_week)
                .push_bind(day.weekday.as_str())
                .push_bind(day.primary.title.as_str())
                .push_bind(day.primary.rank.as_str())
                .push_bind(day.primary.rank_priority)
                .push_bind(day.primary.colour.as_str())
                .push_bind(alternative.map(|c| c.title.as_str()))
                .push_bind(alternative.map(|c| c.rank.as_str()))
                .push_bind(alternative.map(|c| c.rank_priority))
                .push_bind(alternative.map(|c| c.colour.as_str()))
                .push_bind(day.source.as_str())
                .push_bind(day.is_custom_edit);
        });

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn get_day(
        &self,
        locale: Locale,
        date: NaiveDate,
    ) -> Result<Option<CalendarDayRecord>, OrdoError> {
        let sql = format!(
            "SELECT {} FROM calendar_days WHERE locale = ? AND date = ?",
            DAY_COLUMNS
        );
        let record = sqlx::query_as::<_, CalendarDayRecord>(&sql)
            .bind(locale.code())
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn list_days(
        &self,
        locale: Locale,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CalendarDayRecord>, OrdoError> {
        let sql = format!(
            "SELECT {} FROM calendar_days WHERE locale = ? AND date >= ? AND date <= ? ORDER BY date",
            DAY_COLUMNS
        );
        let records = sqlx::query_as::<_, CalendarDayRecord>(&sql)
            .bind(locale.code())
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn count_days(
        &self,
        locale: Locale,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, OrdoError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM calendar_days WHERE locale = ? AND date >= ? AND date <= ?",
        )
        .bind(locale.code())
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn list_custom_edit_dates(
        &self,
        locale: Locale,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, OrdoError> {
        let dates = sqlx::query_scalar::<_, NaiveDate>(
            r#"
            SELECT date FROM calendar_days
            WHERE locale = ? AND date >= ? AND date <= ? AND is_custom_edit = 1
            ORDER BY date
            "#,
        )
        .bind(locale.code())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(dates)
    }

    async fn acquire_lease(
        &self,
        locale: Locale,
        year: i32,
        holder: &str,
        ttl: Duration,
    ) -> Result<bool, OrdoError> {
        let now = Utc::now().timestamp_millis();
        let expires_at = now.saturating_add(ttl.as_millis().min(i64::MAX as u128) as i64);

        let result = sqlx::query(
            r#"
            INSERT INTO regeneration_leases (year, locale, holder, acquired_at, expires_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (year, locale) DO UPDATE SET
                holder = excluded.holder,
                acquired_at = excluded.acquired_at,
                expires_at = excluded.expires_at
            WHERE regeneration_leases.expires_at <= excluded.acquired_at
               OR regeneration_leases.holder = excluded.holder
            "#,
        )
        .bind(year)
        .bind(locale.code())
        .bind(holder)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_lease(
        &self,
        locale: Locale,
        year: i32,
        holder: &str,
    ) -> Result<(), OrdoError> {
        sqlx::query("DELETE FROM regeneration_leases WHERE year = ? AND locale = ? AND holder = ?")
            .bind(year)
            .bind(locale.code())
            .bind(holder)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn health_check_db(&self) -> Result<bool, OrdoError> {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!(error = %e, "SQLite health check failed");
                Ok(false)
            }
        }
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
