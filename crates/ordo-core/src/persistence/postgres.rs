// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! PostgreSQL-backed calendar store.
//!
//! Each operation is a free function over a pool so it can be reused from
//! migrations tooling and ad-hoc scripts; [`PostgresStore`] delegates to them.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::warn;

use crate::cycle::YearCycles;
use crate::error::OrdoError;
use crate::locale::Locale;

use super::{
    CalendarDayRecord, CalendarStore, DeleteScope, LiturgicalYearRecord, NewCalendarDay,
};

/// PostgreSQL-backed calendar store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new Postgres-backed store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Year Operations
// ============================================================================

/// Insert or update the year row and return its id.
pub async fn upsert_liturgical_year(
    pool: &PgPool,
    locale: Locale,
    cycles: &YearCycles,
    is_generated: bool,
) -> Result<i64, OrdoError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO liturgical_years (year, locale, lectionary_cycle, ferial_cycle, is_generated, updated_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        ON CONFLICT (year, locale) DO UPDATE SET
            lectionary_cycle = EXCLUDED.lectionary_cycle,
            ferial_cycle = EXCLUDED.ferial_cycle,
            is_generated = EXCLUDED.is_generated,
            updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(cycles.year)
    .bind(locale.code())
    .bind(cycles.lectionary.as_str())
    .bind(cycles.ferial.as_u8() as i32)
    .bind(is_generated)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Get the year row for (locale, year).
pub async fn get_liturgical_year(
    pool: &PgPool,
    locale: Locale,
    year: i32,
) -> Result<Option<LiturgicalYearRecord>, OrdoError> {
    let record = sqlx::query_as::<_, LiturgicalYearRecord>(
        r#"
        SELECT id, year, locale, lectionary_cycle, ferial_cycle, is_generated, updated_at
        FROM liturgical_years
        WHERE year = $1 AND locale = $2
        "#,
    )
    .bind(year)
    .bind(locale.code())
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// List year rows, optionally for one locale.
pub async fn list_liturgical_years(
    pool: &PgPool,
    locale: Option<Locale>,
) -> Result<Vec<LiturgicalYearRecord>, OrdoError> {
    let records = sqlx::query_as::<_, LiturgicalYearRecord>(
        r#"
        SELECT id, year, locale, lectionary_cycle, ferial_cycle, is_generated, updated_at
        FROM liturgical_years
        WHERE ($1::TEXT IS NULL OR locale = $1)
        ORDER BY year, locale
        "#,
    )
    .bind(locale.map(|l| l.code()))
    .fetch_all(pool)
    .await?;

    Ok(records)
}

// ============================================================================
// Day Operations
// ============================================================================

/// Delete day rows in an inclusive date range.
pub async fn delete_days(
    pool: &PgPool,
    locale: Locale,
    start: NaiveDate,
    end: NaiveDate,
    scope: DeleteScope,
) -> Result<u64, OrdoError> {
    let sql = match scope {
        DeleteScope::All => {
            "DELETE FROM calendar_days WHERE locale = $1 AND date >= $2 AND date <= $3"
        }
        DeleteScope::GeneratedOnly => {
            "DELETE FROM calendar_days WHERE locale = $1 AND date >= $2 AND date <= $3 AND NOT is_custom_edit"
        }
    };

    let result = sqlx::query(sql)
        .bind(locale.code())
        .bind(start)
        .bind(end)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Insert day rows with one multi-row statement.
pub async fn insert_days(pool: &PgPool, days: &[NewCalendarDay]) -> Result<u64, OrdoError> {
    if days.is_empty() {
        return Ok(0);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
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

    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected())
}

const DAY_COLUMNS: &str = r#"
    id, date, locale, liturgical_year_id, season, season_week, weekday,
    primary_title, primary_rank, primary_rank_priority, primary_colour,
    alternative_title, alternative_rank, alternative_rank_priority, alternative_colour,
    source, is_custom_edit, created_at
"#;

/// Get one stored day.
pub async fn get_day(
    pool: &PgPool,
    locale: Locale,
    date: NaiveDate,
) -> Result<Option<CalendarDayRecord>, OrdoError> {
    let sql = format!(
        "SELECT {} FROM calendar_days WHERE locale = $1 AND date = $2",
        DAY_COLUMNS
    );
    let record = sqlx::query_as::<_, CalendarDayRecord>(&sql)
        .bind(locale.code())
        .bind(date)
        .fetch_optional(pool)
        .await?;

    Ok(record)
}

/// List stored days in an inclusive range, ordered by date.
pub async fn list_days(
    pool: &PgPool,
    locale: Locale,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<CalendarDayRecord>, OrdoError> {
    let sql = format!(
        "SELECT {} FROM calendar_days WHERE locale = $1 AND date >= $2 AND date <= $3 ORDER BY date",
        DAY_COLUMNS
    );
    let records = sqlx::query_as::<_, CalendarDayRecord>(&sql)
        .bind(locale.code())
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

    Ok(records)
}

/// Count stored days in an inclusive range.
pub async fn count_days(
    pool: &PgPool,
    locale: Locale,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<i64, OrdoError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM calendar_days WHERE locale = $1 AND date >= $2 AND date <= $3",
    )
    .bind(locale.code())
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Dates holding custom-edited rows.
pub async fn list_custom_edit_dates(
    pool: &PgPool,
    locale: Locale,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<NaiveDate>, OrdoError> {
    let dates = sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT date FROM calendar_days
        WHERE locale = $1 AND date >= $2 AND date <= $3 AND is_custom_edit
        ORDER BY date
        "#,
    )
    .bind(locale.code())
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(dates)
}

// ============================================================================
// Lease Operations
// ============================================================================

/// Take or renew the regeneration lease for (locale, year).
pub async fn acquire_lease(
    pool: &PgPool,
    locale: Locale,
    year: i32,
    holder: &str,
    ttl: Duration,
) -> Result<bool, OrdoError> {
    let now = Utc::now();
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| OrdoError::validation("ORDO_LEASE_TTL_SECS", e.to_string()))?;

    let result = sqlx::query(
        r#"
        INSERT INTO regeneration_leases (year, locale, holder, acquired_at, expires_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (year, locale) DO UPDATE SET
            holder = EXCLUDED.holder,
            acquired_at = EXCLUDED.acquired_at,
            expires_at = EXCLUDED.expires_at
        WHERE regeneration_leases.expires_at <= EXCLUDED.acquired_at
           OR regeneration_leases.holder = EXCLUDED.holder
        "#,
    )
    .bind(year)
    .bind(locale.code())
    .bind(holder)
    .bind(now)
    .bind(now + ttl)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Release the lease if `holder` owns it.
pub async fn release_lease(
    pool: &PgPool,
    locale: Locale,
    year: i32,
    holder: &str,
) -> Result<(), OrdoError> {
    sqlx::query("DELETE FROM regeneration_leases WHERE year = $1 AND locale = $2 AND holder = $3")
        .bind(year)
        .bind(locale.code())
        .bind(holder)
        .execute(pool)
        .await?;

    Ok(())
}

/// Check database connectivity.
pub async fn health_check(pool: &PgPool) -> Result<bool, OrdoError> {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => Ok(true),
        Err(e) => {
            warn!(error = %e, "PostgreSQL health check failed");
            Ok(false)
        }
    }
}

#[async_trait]
impl CalendarStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn upsert_liturgical_year(
        &self,
        locale: Locale,
        cycles: &YearCycles,
        is_generated: bool,
    ) -> Result<i64, OrdoError> {
        upsert_liturgical_year(&self.pool, locale, cycles, is_generated).await
    }

    async fn get_liturgical_year(
        &self,
        locale: Locale,
        year: i32,
    ) -> Result<Option<LiturgicalYearRecord>, OrdoError> {
        get_liturgical_year(&self.pool, locale, year).await
    }

    async fn list_liturgical_years(
        &self,
        locale: Option<Locale>,
    ) -> Result<Vec<LiturgicalYearRecord>, OrdoError> {
        list_liturgical_years(&self.pool, locale).await
    }

    async fn delete_days(
        &self,
        locale: Locale,
        start: NaiveDate,
        end: NaiveDate,
        scope: DeleteScope,
    ) -> Result<u64, OrdoError> {
        delete_days(&self.pool, locale, start, end, scope).await
    }

    async fn insert_days(&self, days: &[NewCalendarDay]) -> Result<u64, OrdoError> {
        insert_days(&self.pool, days).await
    }

    async fn get_day(
        &self,
        locale: Locale,
        date: NaiveDate,
    ) -> Result<Option<CalendarDayRecord>, OrdoError> {
        get_day(&self.pool, locale, date).await
    }

    async fn list_days(
        &self,
        locale: Locale,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CalendarDayRecord>, OrdoError> {
        list_days(&self.pool, locale, start, end).await
    }

    async fn count_days(
        &self,
        locale: Locale,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, OrdoError> {
        count_days(&self.pool, locale, start, end).await
    }

    async fn list_custom_edit_dates(
        &self,
        locale: Locale,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, OrdoError> {
        list_custom_edit_dates(&self.pool, locale, start, end).await
    }

    async fn acquire_lease(
        &self,
        locale: Locale,
        year: i32,
        holder: &str,
        ttl: Duration,
    ) -> Result<bool, OrdoError> {
        acquire_lease(&self.pool, locale, year, holder, ttl).await
    }

    async fn release_lease(
        &self,
        locale: Locale,
        year: i32,
        holder: &str,
    ) -> Result<(), OrdoError> {
        release_lease(&self.pool, locale, year, holder).await
    }

    async fn health_check_db(&self) -> Result<bool, OrdoError> {
        health_check(&self.pool).await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
