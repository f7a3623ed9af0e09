// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Cache-only reader backed by precomputed rows.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, warn};

use super::{CalendarReader, DataSource, DayResponse, DayView, MonthResponse, YearResponse};
use crate::error::{OrdoError, Result};
use crate::locale::Locale;
use crate::persistence::CalendarStore;

/// Reader that only consults the store.
pub struct CacheReader {
    store: Arc<dyn CalendarStore>,
}

impl CacheReader {
    /// Create a reader over a store.
    pub fn new(store: Arc<dyn CalendarStore>) -> Self {
        Self { store }
    }

    /// Every stored day of the range, or `NotFound` unless all of them are stored.
    ///
    /// A failed insert chunk leaves a gap, and a gap is reported as missing data
    /// rather than served as a shorter range.
    async fn complete_range(
        &self,
        locale: Locale,
        start: NaiveDate,
        end: NaiveDate,
        label: String,
    ) -> Result<Vec<DayView>> {
        let rows = self.store.list_days(locale, start, end).await?;
        debug!(locale = %locale, start = %start, end = %end, rows = rows.len(), "Read precomputed range");

        let expected = crate::dates::days_in_range(start, end);
        if rows.is_empty() {
            return Err(OrdoError::NotFound(format!("Calendar data for {} {}", locale, label)));
        }
        if rows.len() != expected {
            warn!(locale = %locale, start = %start, end = %end, stored = rows.len(), expected, "Precomputed range is incomplete");
            return Err(OrdoError::NotFound(format!(
                "Calendar data for {} {} is incomplete ({} of {} days stored)",
                locale,
                label,
                rows.len(),
                expected
            )));
        }
        Ok(rows.into_iter().map(DayView::from).collect())
    }
}

#[async_trait]
impl CalendarReader for CacheReader {
    fn data_source(&self) -> DataSource {
        DataSource::Precomputed
    }

    async fn day(&self, locale: Locale, date: NaiveDate) -> Result<DayResponse> {
        let row = self
            .store
            .get_day(locale, date)
            .await?
            .ok_or_else(|| OrdoError::NotFound(format!("Calendar data for {} {}", locale, date)))?;

        Ok(DayResponse {
            day: row.into(),
            data_source: DataSource::Precomputed,
        })
    }

    async fn month(&self, locale: Locale, year: i32, month: u32) -> Result<MonthResponse> {
        let (start, end) = crate::dates::month_bounds(year, month)?;
        let days = self
            .complete_range(locale, start, end, format!("{:04}-{:02}", year, month))
            .await?;

        Ok(MonthResponse {
            year,
            month,
            lang: locale,
            days,
            data_source: DataSource::Precomputed,
        })
    }

    async fn year(&self, locale: Locale, year: i32) -> Result<YearResponse> {
        let (start, end) = crate::dates::year_bounds(year)?;
        let days = self
            .complete_range(locale, start, end, year.to_string())
            .await?;

        Ok(YearResponse {
            year,
            lang: locale,
            total_days: days.len(),
            days,
            data_source: DataSource::Precomputed,
        })
    }

    async fn ready(&self) -> Result<bool> {
        self.store.health_check_db().await
    }
}
