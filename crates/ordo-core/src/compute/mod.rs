// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Compute engine client.
//!
//! The engine is an external, deterministic and expensive program: given a locale
//! and a date range it returns canonical liturgical metadata for every day. This
//! module defines the narrow typed interface the rest of the crate uses and two
//! backends:
//!
//! | Engine | Description |
//! |--------|-------------|
//! | [`ProcessEngine`] | Spawns the configured program with discrete typed arguments |
//! | [`MockEngine`] | Deterministic in-process engine for tests and local development |

pub mod mock;
pub mod process;

pub use mock::MockEngine;
pub use process::ProcessEngine;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::locale::Locale;

/// Errors from compute engine invocations.
///
/// Every variant is fatal for the invocation: callers must propagate it and never
/// treat it as an empty result.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ComputeError {
    /// Requested range ends before it starts.
    #[error("Invalid range: {start} is after {end}")]
    InvalidRange {
        /// Range start.
        start: NaiveDate,
        /// Range end.
        end: NaiveDate,
    },

    /// Engine process could not be started.
    #[error("Failed to start engine: {0}")]
    Spawn(#[from] std::io::Error),

    /// Engine did not finish within the configured timeout.
    #[error("Engine timed out after {0:?}")]
    Timeout(Duration),

    /// Engine exited with a non-zero status.
    #[error("Engine exited with code {exit_code}: {stderr}")]
    ExitCode {
        /// Exit code from the process (-1 when killed by a signal).
        exit_code: i32,
        /// Standard error output.
        stderr: String,
    },

    /// Engine produced no output.
    #[error("Engine produced no output")]
    EmptyOutput,

    /// Engine output could not be parsed.
    #[error("Malformed engine output: {0}")]
    Malformed(String),

    /// Engine output does not cover the requested range day by day.
    #[error("Engine returned {received} days for a range of {expected}")]
    IncompleteRange {
        /// Days in the requested range.
        expected: usize,
        /// Days returned.
        received: usize,
    },

    /// Engine output contains a date outside the requested sequence.
    #[error("Engine returned {found} where {expected} was expected")]
    UnexpectedDate {
        /// The date expected at this position.
        expected: NaiveDate,
        /// The date actually returned.
        found: NaiveDate,
    },

    /// Engine is unavailable.
    #[error("Engine unavailable: {0}")]
    Unavailable(String),
}

/// A named observance with its rank and liturgical colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Celebration {
    /// Display title.
    #[serde(alias = "name")]
    pub title: String,
    /// Rank label (Solemnity, Feast, Memorial, ...).
    #[serde(default)]
    pub rank: String,
    /// Rank precedence; lower wins.
    #[serde(default)]
    pub rank_priority: i32,
    /// Liturgical colour.
    #[serde(default, alias = "color")]
    pub colour: String,
}

impl Celebration {
    /// Whether this celebration should appear in responses.
    pub fn is_visible(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

/// Normalized engine output for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Calendar date.
    pub date: NaiveDate,
    /// Liturgical season name.
    pub season: String,
    /// Week index within the season.
    #[serde(default)]
    pub season_week: i32,
    /// Weekday name.
    pub weekday: String,
    /// Celebrations in precedence order; only the first two are kept by callers.
    #[serde(default)]
    pub celebrations: Vec<Celebration>,
}

impl DayRecord {
    /// The primary (first) celebration, if any.
    pub fn primary(&self) -> Option<&Celebration> {
        self.celebrations.first()
    }

    /// The alternative (second) celebration, if any.
    pub fn alternative(&self) -> Option<&Celebration> {
        self.celebrations.get(1)
    }
}

/// Typed interface to the liturgical computation engine.
#[async_trait]
pub trait ComputeEngine: Send + Sync {
    /// Short name of the backend, for logs.
    fn engine_type(&self) -> &'static str;

    /// Compute every day in `[start, end]`, ordered by date.
    async fn compute_range(
        &self,
        locale: Locale,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DayRecord>, ComputeError>;

    /// Compute a single day.
    async fn compute_day(&self, locale: Locale, date: NaiveDate) -> Result<DayRecord, ComputeError> {
        let mut records = self.compute_range(locale, date, date).await?;
        verify_coverage(date, date, &mut records)?;
        records.pop().ok_or(ComputeError::IncompleteRange {
            expected: 1,
            received: 0,
        })
    }
}

/// Build the engine selected by configuration.
pub fn engine_from_config(config: &EngineConfig) -> Arc<dyn ComputeEngine> {
    if config.is_mock() {
        Arc::new(MockEngine::new())
    } else {
        Arc::new(ProcessEngine::new(config.clone()))
    }
}

/// Check that `records` holds exactly one entry per day of `[start, end]`.
///
/// Records are sorted by date first; any gap, duplicate or out-of-range date is
/// an error.
pub fn verify_coverage(
    start: NaiveDate,
    end: NaiveDate,
    records: &mut [DayRecord],
) -> Result<(), ComputeError> {
    let expected = crate::dates::days_in_range(start, end);
    if records.len() != expected {
        return Err(ComputeError::IncompleteRange {
            expected,
            received: records.len(),
        });
    }

    records.sort_by_key(|r| r.date);
    for (record, date) in records.iter().zip(crate::dates::each_day(start, end)) {
        if record.date != date {
            return Err(ComputeError::UnexpectedDate {
                expected: date,
                found: record.date,
            });
        }
    }
    Ok(())
}
