// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Regeneration plans: which (locale, year) pairs a run covers.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::OrdoError;
use crate::locale::Locale;

/// A single year or an inclusive range of years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearSpec {
    /// One calendar year.
    Single(i32),
    /// Inclusive range of calendar years.
    Range {
        /// First year.
        start: i32,
        /// Last year (inclusive).
        end: i32,
    },
}

impl YearSpec {
    /// The years covered, in ascending order.
    pub fn years(&self) -> RangeInclusive<i32> {
        match *self {
            YearSpec::Single(year) => year..=year,
            YearSpec::Range { start, end } => start..=end,
        }
    }
}

impl fmt::Display for YearSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearSpec::Single(year) => write!(f, "{}", year),
            YearSpec::Range { start, end } => write!(f, "{}-{}", start, end),
        }
    }
}

/// Parses `2025`, `2025-2030` or `2025..2030`.
impl FromStr for YearSpec {
    type Err = OrdoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse_year = |part: &str| {
            part.trim().parse::<i32>().map_err(|_| {
                OrdoError::validation("years", format!("'{}' is not a valid year", part.trim()))
            })
        };

        let bounds = s.split_once("..").or_else(|| {
            // A leading '-' is a sign, not a separator
            s.char_indices()
                .skip(1)
                .find(|(_, c)| *c == '-')
                .map(|(i, _)| (&s[..i], &s[i + 1..]))
        });

        match bounds {
            None => Ok(YearSpec::Single(parse_year(s)?)),
            Some((start, end)) => {
                let start = parse_year(start)?;
                let end = parse_year(end)?;
                if start > end {
                    return Err(OrdoError::validation(
                        "years",
                        format!("range start {} is after end {}", start, end),
                    ));
                }
                if start == end {
                    Ok(YearSpec::Single(start))
                } else {
                    Ok(YearSpec::Range { start, end })
                }
            }
        }
    }
}

/// The pairs a regeneration run will process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegenerationPlan {
    /// Years to regenerate.
    pub years: YearSpec,
    /// Locales to regenerate, in processing order.
    pub locales: Vec<Locale>,
}

impl RegenerationPlan {
    /// Plan for the given years over every supported locale.
    pub fn all_locales(years: YearSpec) -> Self {
        Self {
            years,
            locales: Locale::ALL.to_vec(),
        }
    }

    /// Every (locale, year) pair, locale-major.
    pub fn pairs(&self) -> Vec<(Locale, i32)> {
        self.locales
            .iter()
            .flat_map(|locale| self.years.years().map(move |year| (*locale, year)))
            .collect()
    }
}
