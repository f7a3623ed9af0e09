// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Live reader: every request goes to the compute engine.
//!
//! Nothing is cached or persisted, and concurrent requests for the same range
//! each invoke the engine. The engine timeout is the only bound on latency.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{CalendarReader, DataSource, DayResponse, DayView, MonthResponse, YearResponse};
use crate::compute::ComputeEngine;
use crate::error::Result;
use crate::locale::Locale;

/// Reader that computes on demand.
pub struct LiveReader {
    engine: Arc<dyn ComputeEngine>,
}

impl LiveReader {
    /// Create a reader over an engine.
    pub fn new(engine: Arc<dyn ComputeEngine>) -> Self {
        Self { engine }
    }

    async fn range(&self, locale: Locale, start: NaiveDate, end: NaiveDate) -> Result<Vec<DayView>> {
        let records = self.engine.compute_range(locale, start, end).await?;
        Ok(records.into_iter().map(DayView::from).collect())
    }
}

#[async_trait]
impl CalendarReader for LiveReader {
    fn data_source(&self) -> DataSource {
        DataSource::Live
    }

    async fn day(&self, locale: Locale, date: NaiveDate) -> Result<DayResponse> {
        let record = self.engine.compute_day(locale, date).await?;
        Ok(DayResponse {
            day: record.into(),
            data_source: DataSource::Live,
        })
    }

    async fn month(&self, locale: Locale, year: i32, month: u32) -> Result<MonthResponse> {
        let (start, end) = crate::dates::month_bounds(year, month)?;
        Ok(MonthResponse {
            year,
            month,
            lang: locale,
            days: self.range(locale, start, end).await?,
            data_source: DataSource::Live,
        })
    }

    async fn year(&self, locale: Locale, year: i32) -> Result<YearResponse> {
        let (start, end) = crate::dates::year_bounds(year)?;
        let days = self.range(locale, start, end).await?;
        Ok(YearResponse {
            year,
            lang: locale,
            total_days: days.len(),
            days,
            data_source: DataSource::Live,
        })
    }

    async fn ready(&self) -> Result<bool> {
        Ok(true)
    }
}
