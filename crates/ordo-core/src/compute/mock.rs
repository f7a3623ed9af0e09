// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mock compute engine for testing.
//!
//! A deterministic engine that produces one record per day from a simplified
//! season table and a handful of fixed feasts, without running any program.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};

use super::{Celebration, ComputeEngine, ComputeError, DayRecord};
use crate::locale::Locale;

/// Mock engine for testing.
pub struct MockEngine {
    calls: AtomicUsize,
    /// If true, every call fails
    pub fail_by_default: bool,
    /// Years for which calls fail
    pub failing_years: HashSet<i32>,
    /// If true, the 13th of each month carries an optional memorial as alternative
    pub with_alternatives: bool,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create a new mock engine.
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_by_default: false,
            failing_years: HashSet::new(),
            with_alternatives: false,
        }
    }

    /// Create a mock engine that fails every call.
    pub fn failing() -> Self {
        Self {
            fail_by_default: true,
            ..Self::new()
        }
    }

    /// Fail calls whose range touches `year`.
    pub fn fail_on_year(mut self, year: i32) -> Self {
        self.failing_years.insert(year);
        self
    }

    /// Emit an alternative celebration on the 13th of each month.
    pub fn with_alternatives(mut self) -> Self {
        self.with_alternatives = true;
        self
    }

    /// Number of compute calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The record this engine produces for a date.
    pub fn day(&self, locale: Locale, date: NaiveDate) -> DayRecord {
        let season = season_of(date);
        let weekday = weekday_name(date.weekday());

        let mut celebrations = Vec::new();
        if let Some(feast) = fixed_feast(locale, date) {
            celebrations.push(feast);
        } else if date.weekday() == Weekday::Sun {
            celebrations.push(Celebration {
                title: format!("Sunday of {}", season.name),
                rank: "Sunday".to_string(),
                rank_priority: 6,
                colour: season.colour.to_string(),
            });
        } else {
            celebrations.push(Celebration {
                title: format!("{} of {}", weekday, season.name),
                rank: "Weekday".to_string(),
                rank_priority: 13,
                colour: season.colour.to_string(),
            });
        }

        if self.with_alternatives && date.day() == 13 {
            celebrations.push(Celebration {
                title: "Optional Memorial".to_string(),
                rank: "Optional Memorial".to_string(),
                rank_priority: 12,
                colour: "white".to_string(),
            });
        }

        DayRecord {
            date,
            season: season.name.to_string(),
            season_week: (date.ordinal0() / 7 + 1) as i32,
            weekday: weekday.to_string(),
            celebrations,
        }
    }
}

#[async_trait]
impl ComputeEngine for MockEngine {
    fn engine_type(&self) -> &'static str {
        "mock"
    }

    async fn compute_range(
        &self,
        locale: Locale,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DayRecord>, ComputeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if start > end {
            return Err(ComputeError::InvalidRange { start, end });
        }
        if self.fail_by_default
            || (start.year()..=end.year()).any(|y| self.failing_years.contains(&y))
        {
            return Err(ComputeError::Unavailable(format!(
                "mock failure for {} {}..{}",
                locale, start, end
            )));
        }

        Ok(crate::dates::each_day(start, end)
            .map(|date| self.day(locale, date))
            .collect())
    }
}

struct Season {
    name: &'static str,
    colour: &'static str,
}

fn season_of(date: NaiveDate) -> Season {
    let (name, colour) = match (date.month(), date.day()) {
        (12, 25..=31) | (1, 1..=6) => ("Christmas", "white"),
        (12, _) => ("Advent", "violet"),
        (3, _) => ("Lent", "violet"),
        (4, _) | (5, _) => ("Easter", "white"),
        _ => ("Ordinary Time", "green"),
    };
    Season { name, colour }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn fixed_feast(locale: Locale, date: NaiveDate) -> Option<Celebration> {
    let (en, es, la, rank, rank_priority, colour) = match (date.month(), date.day()) {
        (1, 1) => (
            "Mary, the Holy Mother of God",
            "Santa María, Madre de Dios",
            "Sanctae Dei Genetricis Mariae",
            "Solemnity",
            3,
            "white",
        ),
        (8, 15) => (
            "The Assumption of the Blessed Virgin Mary",
            "La Asunción de la Virgen María",
            "In Assumptione Beatae Mariae Virginis",
            "Solemnity",
            3,
            "white",
        ),
        (11, 1) => (
            "All Saints",
            "Todos los Santos",
            "Omnium Sanctorum",
            "Solemnity",
            3,
            "white",
        ),
        (12, 8) => (
            "The Immaculate Conception of the Blessed Virgin Mary",
            "La Inmaculada Concepción de la Virgen María",
            "In Conceptione Immaculata Beatae Mariae Virginis",
            "Solemnity",
            3,
            "white",
        ),
        (12, 25) => (
            "The Nativity of the Lord",
            "La Natividad del Señor",
            "In Nativitate Domini",
            "Solemnity",
            2,
            "white",
        ),
        _ => return None,
    };

    let title = match locale {
        Locale::En => en,
        Locale::Es => es,
        _ => la,
    };
    Some(Celebration {
        title: title.to_string(),
        rank: rank.to_string(),
        rank_priority,
        colour: colour.to_string(),
    })
}
