// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Regeneration orchestrator.
//!
//! Brings the stored days of each requested (locale, year) pair into agreement
//! with a fresh engine computation. Pairs run one at a time:
//!
//! 1. Take the regeneration lease for the pair
//! 2. Upsert the year row with its cycle labels
//! 3. Delete the pair's stored days (abort the pair on failure)
//! 4. Compute the full year (a failure is recorded, nothing is inserted)
//! 5. Insert the rows chunk by chunk; a failed chunk is recorded and the rest are still attempted
//! 6. Release the lease
//!
//! No transaction spans a pair, so a failed chunk leaves a gap until the next run.

mod plan;
mod summary;

pub use plan::{RegenerationPlan, YearSpec};
pub use summary::{ChunkFailure, PairOutcome, PairStatus, RunSummary};

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::compute::ComputeEngine;
use crate::cycle::cycles_for_year;
use crate::error::{OrdoError, Result};
use crate::locale::Locale;
use crate::persistence::{CalendarStore, DeleteScope, NewCalendarDay};

/// What a regeneration does with days that were edited by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CustomEditPolicy {
    /// Replace every stored day, custom edits included.
    #[default]
    Overwrite,
    /// Keep custom-edited days and skip the generated row for those dates.
    Preserve,
}

impl fmt::Display for CustomEditPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomEditPolicy::Overwrite => f.write_str("overwrite"),
            CustomEditPolicy::Preserve => f.write_str("preserve"),
        }
    }
}

/// Regeneration settings.
#[derive(Debug, Clone)]
pub struct RegenerationConfig {
    /// Rows per insert statement.
    pub batch_size: usize,
    /// Pause between pairs.
    pub pair_delay: Duration,
    /// Lifetime of a pair lease.
    pub lease_ttl: Duration,
    /// Custom edit handling.
    pub custom_edits: CustomEditPolicy,
}

impl Default for RegenerationConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            pair_delay: Duration::from_millis(1000),
            lease_ttl: Duration::from_secs(900),
            custom_edits: CustomEditPolicy::Overwrite,
        }
    }
}

/// Drives the engine and the store for a set of (locale, year) pairs.
pub struct Regenerator {
    store: Arc<dyn CalendarStore>,
    engine: Arc<dyn ComputeEngine>,
    config: RegenerationConfig,
    holder: String,
}

impl Regenerator {
    /// Create a regenerator with a unique lease holder id.
    pub fn new(
        store: Arc<dyn CalendarStore>,
        engine: Arc<dyn ComputeEngine>,
        config: RegenerationConfig,
    ) -> Self {
        Self {
            store,
            engine,
            config,
            holder: format!("ordo-regen-{}", uuid::Uuid::new_v4()),
        }
    }

    /// Lease holder id used by this regenerator.
    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Process every pair of the plan and report each outcome.
    ///
    /// Never stops early: a failed pair is recorded and the next one runs.
    pub async fn run(&self, plan: &RegenerationPlan) -> RunSummary {
        let pairs = plan.pairs();
        info!(
            pairs = pairs.len(),
            years = %plan.years,
            engine = self.engine.engine_type(),
            store = self.store.backend(),
            batch_size = self.config.batch_size,
            custom_edits = %self.config.custom_edits,
            "Starting regeneration run"
        );

        let mut summary = RunSummary::default();
        for (i, (locale, year)) in pairs.into_iter().enumerate() {
            if i > 0 && !self.config.pair_delay.is_zero() {
                tokio::time::sleep(self.config.pair_delay).await;
            }
            summary.outcomes.push(self.regenerate_pair(locale, year).await);
        }

        info!(
            succeeded = summary.succeeded(),
            unsuccessful = summary.unsuccessful(),
            rows_saved = summary.rows_saved(),
            "Regeneration run finished"
        );
        summary
    }

    /// Regenerate a single (locale, year) pair.
    pub async fn regenerate_pair(&self, locale: Locale, year: i32) -> PairOutcome {
        let started = Instant::now();
        let mut outcome = PairOutcome::pending(locale, year);

        match self.acquire_lease(locale, year).await {
            Ok(()) => {
                let result = self.regenerate_locked(locale, year, &mut outcome).await;

                if let Err(e) = self
                    .store
                    .release_lease(locale, year, &self.holder)
                    .await
                {
                    warn!(locale = %locale, year, error = %e, "Failed to release regeneration lease");
                }

                if let Err(e) = result {
                    outcome.status = PairStatus::Failed {
                        reason: e.to_string(),
                    };
                }
            }
            Err(e) => {
                outcome.status = PairStatus::Failed {
                    reason: e.to_string(),
                };
            }
        }

        outcome.duration = started.elapsed();
        match &outcome.status {
            PairStatus::Succeeded => info!(
                locale = %locale,
                year,
                saved = outcome.saved,
                total = outcome.total,
                deleted = outcome.deleted,
                duration_ms = outcome.duration.as_millis() as u64,
                "Pair regenerated"
            ),
            PairStatus::Partial => warn!(
                locale = %locale,
                year,
                saved = outcome.saved,
                total = outcome.total,
                failed_chunks = outcome.chunk_failures.len(),
                "Pair partially regenerated"
            ),
            PairStatus::Failed { reason } => error!(
                locale = %locale,
                year,
                reason = %reason,
                "Pair regeneration failed"
            ),
        }
        outcome
    }

    async fn acquire_lease(&self, locale: Locale, year: i32) -> Result<()> {
        let acquired = self
            .store
            .acquire_lease(locale, year, &self.holder, self.config.lease_ttl)
            .await?;
        if !acquired {
            return Err(OrdoError::LeaseUnavailable {
                locale: locale.code().to_string(),
                year,
            });
        }
        debug!(locale = %locale, year, holder = %self.holder, "Regeneration lease acquired");
        Ok(())
    }

    async fn regenerate_locked(
        &self,
        locale: Locale,
        year: i32,
        outcome: &mut PairOutcome,
    ) -> Result<()> {
        let (start, end) = crate::dates::year_bounds(year)?;
        let cycles = cycles_for_year(year);

        let year_id = self
            .store
            .upsert_liturgical_year(locale, &cycles, true)
            .await?;

        let (scope, kept): (DeleteScope, HashSet<NaiveDate>) = match self.config.custom_edits {
            CustomEditPolicy::Overwrite => (DeleteScope::All, HashSet::new()),
            CustomEditPolicy::Preserve => (
                DeleteScope::GeneratedOnly,
                self.store
                    .list_custom_edit_dates(locale, start, end)
                    .await?
                    .into_iter()
                    .collect(),
            ),
        };

        outcome.deleted = self.store.delete_days(locale, start, end, scope).await?;
        debug!(locale = %locale, year, deleted = outcome.deleted, "Cleared stored days");

        let records = self.engine.compute_range(locale, start, end).await?;

        let rows: Vec<NewCalendarDay> = records
            .into_iter()
            .filter(|r| !kept.contains(&r.date))
            .map(|r| NewCalendarDay::generated(r, locale, year_id))
            .collect();
        outcome.total = rows.len();
        outcome.preserved = kept.len();

        let chunk_count = rows.len().div_ceil(self.config.batch_size.max(1));
        for (i, chunk) in rows.chunks(self.config.batch_size.max(1)).enumerate() {
            match self.store.insert_days(chunk).await {
                Ok(inserted) => {
                    outcome.saved += inserted;
                    debug!(locale = %locale, year, chunk = i + 1, chunks = chunk_count, rows = inserted, "Chunk saved");
                }
                Err(e) => {
                    warn!(locale = %locale, year, chunk = i + 1, rows = chunk.len(), error = %e, "Chunk insert failed");
                    outcome.chunk_failures.push(ChunkFailure {
                        index: i + 1,
                        rows: chunk.len(),
                        error: e.to_string(),
                    });
                }
            }
        }

        outcome.status = if outcome.chunk_failures.is_empty() {
            PairStatus::Succeeded
        } else if outcome.chunk_failures.len() == chunk_count {
            PairStatus::Failed {
                reason: format!("all {} chunks failed to insert", chunk_count),
            }
        } else {
            PairStatus::Partial
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::compute::{Celebration, MockEngine};
    use crate::cycle::YearCycles;
    use crate::persistence::{
        CalendarDayRecord, DaySource, LiturgicalYearRecord, SqliteStore,
    };

    async fn sqlite_store() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory SQLite pool");
        crate::migrations::run_sqlite(&pool)
            .await
            .expect("Failed to run migrations");
        SqliteStore::new(pool)
    }

    fn config() -> RegenerationConfig {
        RegenerationConfig {
            pair_delay: Duration::ZERO,
            ..RegenerationConfig::default()
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    /// Wraps a store and injects failures into selected calls.
    struct FlakyStore {
        inner: SqliteStore,
        insert_calls: AtomicUsize,
        fail_insert_call: Option<usize>,
        fail_delete: bool,
    }

    impl FlakyStore {
        fn new(inner: SqliteStore) -> Self {
            Self {
                inner,
                insert_calls: AtomicUsize::new(0),
                fail_insert_call: None,
                fail_delete: false,
            }
        }
    }

    #[async_trait]
    impl CalendarStore for FlakyStore {
        fn backend(&self) -> &'static str {
            "flaky"
        }

        async fn upsert_liturgical_year(
            &self,
            locale: Locale,
            cycles: &YearCycles,
            is_generated: bool,
        ) -> Result<i64> {
            self.inner
                .upsert_liturgical_year(locale, cycles, is_generated)
                .await
        }

        async fn get_liturgical_year(
            &self,
            locale: Locale,
            year: i32,
        ) -> Result<Option<LiturgicalYearRecord>> {
            self.inner.get_liturgical_year(locale, year).await
        }

        async fn list_liturgical_years(
            &self,
            locale: Option<Locale>,
        ) -> Result<Vec<LiturgicalYearRecord>> {
            self.inner.list_liturgical_years(locale).await
        }

        async fn delete_days(
            &self,
            locale: Locale,
            start: NaiveDate,
            end: NaiveDate,
            scope: DeleteScope,
        ) -> Result<u64> {
            if self.fail_delete {
                return Err(OrdoError::store("delete_days", "connection reset"));
            }
            self.inner.delete_days(locale, start, end, scope).await
        }

        async fn insert_days(&self, days: &[NewCalendarDay]) -> Result<u64> {
            let call = self.insert_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_insert_call == Some(call) {
                return Err(OrdoError::store("insert_days", "injected failure"));
            }
            self.inner.insert_days(days).await
        }

        async fn get_day(
            &self,
            locale: Locale,
            date: NaiveDate,
        ) -> Result<Option<CalendarDayRecord>> {
            self.inner.get_day(locale, date).await
        }

        async fn list_days(
            &self,
            locale: Locale,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<CalendarDayRecord>> {
            self.inner.list_days(locale, start, end).await
        }

        async fn count_days(&self, locale: Locale, start: NaiveDate, end: NaiveDate) -> Result<i64> {
            self.inner.count_days(locale, start, end).await
        }

        async fn list_custom_edit_dates(
            &self,
            locale: Locale,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<NaiveDate>> {
            self.inner.list_custom_edit_dates(locale, start, end).await
        }

        async fn acquire_lease(
            &self,
            locale: Locale,
            year: i32,
            holder: &str,
            ttl: Duration,
        ) -> Result<bool> {
            self.inner.acquire_lease(locale, year, holder, ttl).await
        }

        async fn release_lease(&self, locale: Locale, year: i32, holder: &str) -> Result<()> {
            self.inner.release_lease(locale, year, holder).await
        }

        async fn health_check_db(&self) -> Result<bool> {
            self.inner.health_check_db().await
        }

        async fn close(&self) {
            self.inner.close().await
        }
    }

    fn comparable(rows: &[CalendarDayRecord]) -> Vec<(NaiveDate, String, i32, String, String, Option<String>)> {
        rows.iter()
            .map(|r| {
                (
                    r.date,
                    r.season.clone(),
                    r.season_week,
                    r.weekday.clone(),
                    r.primary_title.clone(),
                    r.alternative_title.clone(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_regeneration_is_idempotent() {
        let store = Arc::new(sqlite_store().await);
        let engine = Arc::new(MockEngine::new().with_alternatives());
        let regenerator = Regenerator::new(store.clone(), engine.clone(), config());
        let (start, end) = crate::dates::year_bounds(2025).unwrap();

        let first = regenerator.regenerate_pair(Locale::En, 2025).await;
        assert_eq!(first.status, PairStatus::Succeeded);
        let after_first = store.list_days(Locale::En, start, end).await.unwrap();

        let second = regenerator.regenerate_pair(Locale::En, 2025).await;
        assert_eq!(second.status, PairStatus::Succeeded);
        assert_eq!(second.deleted, 365);
        let after_second = store.list_days(Locale::En, start, end).await.unwrap();

        assert_eq!(after_first.len(), 365);
        assert_eq!(comparable(&after_first), comparable(&after_second));
        assert_eq!(engine.calls(), 2);

        let years = store.list_liturgical_years(None).await.unwrap();
        assert_eq!(years.len(), 1);
        assert_eq!(years[0].lectionary_cycle, "A");
        assert_eq!(years[0].ferial_cycle, 1);
        assert!(years[0].is_generated);
        assert!(after_second.iter().all(|r| r.liturgical_year_id == Some(years[0].id)));
    }

    #[tokio::test]
    async fn test_run_covers_every_pair_completely() {
        let store = Arc::new(sqlite_store().await);
        let regenerator = Regenerator::new(store.clone(), Arc::new(MockEngine::new()), config());
        let plan = RegenerationPlan {
            years: "2024-2025".parse().unwrap(),
            locales: vec![Locale::En, Locale::Es],
        };

        let summary = regenerator.run(&plan).await;
        assert!(summary.all_succeeded());
        assert_eq!(summary.outcomes.len(), 4);
        assert_eq!(summary.rows_saved(), 2 * (366 + 365));

        for locale in [Locale::En, Locale::Es] {
            for (year, expected) in [(2024, 366), (2025, 365)] {
                let (start, end) = crate::dates::year_bounds(year).unwrap();
                let rows = store.list_days(locale, start, end).await.unwrap();
                assert_eq!(rows.len(), expected);
                // One row per date
                let dates: HashSet<_> = rows.iter().map(|r| r.date).collect();
                assert_eq!(dates.len(), expected);
                assert!(rows.iter().all(|r| r.source == DaySource::PregeneratedEngine.as_str()));
            }
        }
    }

    #[tokio::test]
    async fn test_failed_chunk_does_not_stop_the_rest() {
        let mut flaky = FlakyStore::new(sqlite_store().await);
        flaky.fail_insert_call = Some(5);
        let store = Arc::new(flaky);
        let regenerator = Regenerator::new(store.clone(), Arc::new(MockEngine::new()), config());

        let outcome = regenerator.regenerate_pair(Locale::En, 2025).await;

        assert_eq!(outcome.status, PairStatus::Partial);
        assert_eq!(store.insert_calls.load(Ordering::SeqCst), 8);
        assert_eq!(outcome.total, 365);
        assert_eq!(outcome.saved, 315);
        assert_eq!(
            outcome.chunk_failures,
            vec![ChunkFailure {
                index: 5,
                rows: 50,
                error: "Database error during 'insert_days': injected failure".to_string(),
            }]
        );

        // Chunk 5 covers days 201..=250 of the year
        assert!(store.get_day(Locale::En, date("2025-07-19")).await.unwrap().is_some());
        assert!(store.get_day(Locale::En, date("2025-07-20")).await.unwrap().is_none());
        assert!(store.get_day(Locale::En, date("2025-09-07")).await.unwrap().is_none());
        assert!(store.get_day(Locale::En, date("2025-09-08")).await.unwrap().is_some());
        assert!(store.get_day(Locale::En, date("2025-12-31")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_last_chunk_holds_the_remainder() {
        let mut flaky = FlakyStore::new(sqlite_store().await);
        flaky.fail_insert_call = Some(8);
        let regenerator = Regenerator::new(Arc::new(flaky), Arc::new(MockEngine::new()), config());

        let outcome = regenerator.regenerate_pair(Locale::En, 2025).await;
        assert_eq!(outcome.saved, 350);
        assert_eq!(outcome.chunk_failures[0].rows, 15);
    }

    #[tokio::test]
    async fn test_compute_failure_isolated_to_its_pair() {
        let store = Arc::new(sqlite_store().await);
        let engine = Arc::new(MockEngine::new().fail_on_year(2026));
        let regenerator = Regenerator::new(store.clone(), engine, config());
        let plan = RegenerationPlan {
            years: "2025..2027".parse().unwrap(),
            locales: vec![Locale::La],
        };

        let summary = regenerator.run(&plan).await;
        let statuses: Vec<_> = summary.outcomes.iter().map(|o| o.status.label()).collect();
        assert_eq!(statuses, vec!["ok", "failed", "ok"]);
        match &summary.outcomes[1].status {
            PairStatus::Failed { reason } => assert!(reason.contains("mock failure")),
            other => panic!("unexpected status {:?}", other),
        }

        let (start, end) = crate::dates::year_bounds(2026).unwrap();
        assert_eq!(store.count_days(Locale::La, start, end).await.unwrap(), 0);
        let (start, end) = crate::dates::year_bounds(2027).unwrap();
        assert_eq!(store.count_days(Locale::La, start, end).await.unwrap(), 365);
    }

    #[tokio::test]
    async fn test_delete_failure_aborts_before_compute() {
        let mut flaky = FlakyStore::new(sqlite_store().await);
        flaky.fail_delete = true;
        let store = Arc::new(flaky);
        let engine = Arc::new(MockEngine::new());
        let regenerator = Regenerator::new(store.clone(), engine.clone(), config());

        let outcome = regenerator.regenerate_pair(Locale::En, 2025).await;

        assert!(matches!(outcome.status, PairStatus::Failed { .. }));
        assert_eq!(engine.calls(), 0);
        assert_eq!(store.insert_calls.load(Ordering::SeqCst), 0);
        // Lease is released after the failure
        assert!(
            store
                .acquire_lease(Locale::En, 2025, "next-run", Duration::from_secs(60))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_held_lease_blocks_regeneration() {
        let store = Arc::new(sqlite_store().await);
        let engine = Arc::new(MockEngine::new());
        let regenerator = Regenerator::new(store.clone(), engine.clone(), config());

        assert!(
            store
                .acquire_lease(Locale::En, 2025, "other-run", Duration::from_secs(600))
                .await
                .unwrap()
        );

        let outcome = regenerator.regenerate_pair(Locale::En, 2025).await;
        match outcome.status {
            PairStatus::Failed { reason } => assert!(reason.contains("already in progress")),
            other => panic!("unexpected status {:?}", other),
        }
        assert_eq!(engine.calls(), 0);
        assert!(store.get_liturgical_year(Locale::En, 2025).await.unwrap().is_none());

        // A different pair is not blocked
        let other = regenerator.regenerate_pair(Locale::Es, 2025).await;
        assert!(other.is_success());
    }

    fn custom_edit(on: &str) -> NewCalendarDay {
        NewCalendarDay {
            date: date(on),
            locale: Locale::En,
            liturgical_year_id: None,
            season: "Advent".to_string(),
            season_week: 2,
            weekday: "Saturday".to_string(),
            primary: Celebration {
                title: "Saint Lucy, Patroness".to_string(),
                rank: "Feast".to_string(),
                rank_priority: 7,
                colour: "red".to_string(),
            },
            alternative: None,
            source: DaySource::CustomEdit,
            is_custom_edit: true,
        }
    }

    #[tokio::test]
    async fn test_overwrite_policy_replaces_custom_edits() {
        let store = Arc::new(sqlite_store().await);
        store.insert_days(&[custom_edit("2025-12-13")]).await.unwrap();
        let regenerator = Regenerator::new(store.clone(), Arc::new(MockEngine::new()), config());

        let outcome = regenerator.regenerate_pair(Locale::En, 2025).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.deleted, 1);
        assert_eq!(outcome.saved, 365);

        let day = store.get_day(Locale::En, date("2025-12-13")).await.unwrap().unwrap();
        assert!(!day.is_custom_edit);
        assert_eq!(day.source, "pregenerated-engine");
    }

    #[tokio::test]
    async fn test_preserve_policy_keeps_custom_edits() {
        let store = Arc::new(sqlite_store().await);
        store.insert_days(&[custom_edit("2025-12-13")]).await.unwrap();
        let regenerator = Regenerator::new(
            store.clone(),
            Arc::new(MockEngine::new()),
            RegenerationConfig {
                custom_edits: CustomEditPolicy::Preserve,
                ..config()
            },
        );

        let outcome = regenerator.regenerate_pair(Locale::En, 2025).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.preserved, 1);
        assert_eq!(outcome.total, 364);
        assert_eq!(outcome.saved, 364);

        let day = store.get_day(Locale::En, date("2025-12-13")).await.unwrap().unwrap();
        assert!(day.is_custom_edit);
        assert_eq!(day.primary().title, "Saint Lucy, Patroness");

        // A second run keeps it too
        regenerator.regenerate_pair(Locale::En, 2025).await;
        let (start, end) = crate::dates::year_bounds(2025).unwrap();
        assert_eq!(store.count_days(Locale::En, start, end).await.unwrap(), 365);
        assert_eq!(
            store.list_custom_edit_dates(Locale::En, start, end).await.unwrap(),
            vec![date("2025-12-13")]
        );
    }

    #[tokio::test]
    async fn test_pair_delay_only_between_pairs() {
        let store = Arc::new(sqlite_store().await);
        let regenerator = Regenerator::new(
            store,
            Arc::new(MockEngine::new()),
            RegenerationConfig {
                pair_delay: Duration::from_secs(30),
                ..config()
            },
        );
        let plan = RegenerationPlan {
            years: YearSpec::Single(2025),
            locales: vec![Locale::En],
        };

        let summary = tokio::time::timeout(Duration::from_secs(10), regenerator.run(&plan))
            .await
            .expect("a single pair must not wait for the pair delay");
        assert!(summary.all_succeeded());
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_treated_as_one() {
        let store = Arc::new(sqlite_store().await);
        let regenerator = Regenerator::new(
            store,
            Arc::new(MockEngine::new()),
            RegenerationConfig {
                batch_size: 0,
                ..config()
            },
        );
        let outcome = regenerator.regenerate_pair(Locale::Pl, 2025).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.saved, 365);
    }
}
