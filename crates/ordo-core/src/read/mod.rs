// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Read service.
//!
//! Two interchangeable readers answer day, month, year and lectionary queries
//! with one response schema:
//!
//! | Reader | Source | `data_source` |
//! |--------|--------|---------------|
//! | [`CacheReader`] | precomputed rows in the store; a miss is `NotFound` | `precomputed` |
//! | [`LiveReader`] | the compute engine, per request, nothing persisted | `live` |
//!
//! A deployment picks one; there is no fallback from one to the other.

mod cache;
mod live;

pub use cache::CacheReader;
pub use live::LiveReader;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::compute::{Celebration, DayRecord};
use crate::cycle::{FerialCycle, LectionaryCycle, cycles_for_year};
use crate::error::Result;
use crate::locale::Locale;
use crate::persistence::CalendarDayRecord;

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Read from the store.
    Precomputed,
    /// Computed for this request.
    Live,
}

/// One day as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayView {
    /// Calendar date.
    pub date: NaiveDate,
    /// Liturgical season name.
    pub season: String,
    /// Week index within the season.
    pub season_week: i32,
    /// Weekday name.
    pub weekday: String,
    /// Visible celebrations: the primary, then the alternative.
    pub celebrations: Vec<Celebration>,
}

impl From<DayRecord> for DayView {
    fn from(record: DayRecord) -> Self {
        let mut celebrations = record.celebrations.into_iter();
        let primary = celebrations.next();
        let alternative = celebrations.next();
        Self {
            date: record.date,
            season: record.season,
            season_week: record.season_week,
            weekday: record.weekday,
            celebrations: visible_celebrations(primary, alternative),
        }
    }
}

impl From<CalendarDayRecord> for DayView {
    fn from(record: CalendarDayRecord) -> Self {
        let celebrations = visible_celebrations(Some(record.primary()), record.alternative());
        Self {
            date: record.date,
            season: record.season,
            season_week: record.season_week,
            weekday: record.weekday,
            celebrations,
        }
    }
}

/// The celebration list both readers emit. Empty titles are dropped.
pub fn visible_celebrations(
    primary: Option<Celebration>,
    alternative: Option<Celebration>,
) -> Vec<Celebration> {
    primary
        .into_iter()
        .chain(alternative)
        .filter(Celebration::is_visible)
        .collect()
}

/// Response for `action=day`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayResponse {
    /// The day.
    #[serde(flatten)]
    pub day: DayView,
    /// Origin of the data.
    pub data_source: DataSource,
}

/// Response for `action=month`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthResponse {
    /// Calendar year.
    pub year: i32,
    /// Month number (1-12).
    pub month: u32,
    /// Locale.
    pub lang: Locale,
    /// Days of the month in date order.
    pub days: Vec<DayView>,
    /// Origin of the data.
    pub data_source: DataSource,
}

/// Response for `action=year`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearResponse {
    /// Calendar year.
    pub year: i32,
    /// Locale.
    pub lang: Locale,
    /// Number of days returned.
    pub total_days: usize,
    /// Days of the year in date order.
    pub days: Vec<DayView>,
    /// Origin of the data.
    pub data_source: DataSource,
}

/// Response for `action=lectionary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LectionaryResponse {
    /// Calendar year.
    pub year: i32,
    /// Sunday cycle.
    pub lectionary: LectionaryCycle,
    /// Weekday cycle.
    pub ferial_lectionary: FerialCycle,
    /// Origin of the data.
    pub data_source: DataSource,
}

/// Calendar queries shared by both read modes.
#[async_trait]
pub trait CalendarReader: Send + Sync {
    /// Tag put on every response.
    fn data_source(&self) -> DataSource;

    /// One day.
    async fn day(&self, locale: Locale, date: NaiveDate) -> Result<DayResponse>;

    /// Every day of a month.
    async fn month(&self, locale: Locale, year: i32, month: u32) -> Result<MonthResponse>;

    /// Every day of a year.
    async fn year(&self, locale: Locale, year: i32) -> Result<YearResponse>;

    /// Cycle labels for a year; never touches the store or the engine.
    async fn lectionary(&self, year: i32) -> Result<LectionaryResponse> {
        let cycles = cycles_for_year(year);
        Ok(LectionaryResponse {
            year,
            lectionary: cycles.lectionary,
            ferial_lectionary: cycles.ferial,
            data_source: self.data_source(),
        })
    }

    /// Whether the reader's backing resource is reachable.
    async fn ready(&self) -> Result<bool>;
}
