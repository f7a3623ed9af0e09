// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Calendar range helpers with validation.

use chrono::NaiveDate;

use crate::error::{OrdoError, Result};

/// Build a date from request parts, rejecting impossible dates such as Feb 30.
pub fn date_from_parts(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    if !(1..=12).contains(&month) {
        return Err(OrdoError::validation("month", "must be between 1 and 12"));
    }
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        OrdoError::validation(
            "day",
            format!("{:04}-{:02}-{:02} is not a valid date", year, month, day),
        )
    })
}

/// First and last day of a calendar year.
pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(OrdoError::validation(
            "year",
            format!("{} is outside the supported date range", year),
        )),
    }
}

/// First and last day of a month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = date_from_parts(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let end = next
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| OrdoError::validation("year", "outside the supported date range"))?;
    Ok((start, end))
}

/// Number of days in a calendar year (365 or 366).
pub fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// Inclusive day count of a range; zero when `end < start`.
pub fn days_in_range(start: NaiveDate, end: NaiveDate) -> usize {
    if end < start {
        0
    } else {
        (end - start).num_days() as usize + 1
    }
}

/// Iterate every date in `[start, end]`.
pub fn each_day(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_bounds() {
        let (start, end) = year_bounds(2025).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert!(year_bounds(i32::MAX).is_err());
    }

    #[test]
    fn test_month_bounds() {
        let (start, end) = month_bounds(2024, 2).unwrap();
        assert_eq!(start.to_string(), "2024-02-01");
        assert_eq!(end.to_string(), "2024-02-29");

        let (_, end) = month_bounds(2025, 12).unwrap();
        assert_eq!(end.to_string(), "2025-12-31");

        assert!(month_bounds(2025, 0).is_err());
        assert!(month_bounds(2025, 13).is_err());
    }

    #[test]
    fn test_date_from_parts_rejects_impossible_dates() {
        assert!(date_from_parts(2025, 2, 29).is_err());
        assert!(date_from_parts(2024, 2, 29).is_ok());
        let err = date_from_parts(2025, 4, 31).unwrap_err();
        assert!(matches!(err, OrdoError::Validation { ref field, .. } if field == "day"));
    }

    #[test]
    fn test_day_counts() {
        assert_eq!(days_in_year(2025), 365);
        assert_eq!(days_in_year(2024), 366);
        assert_eq!(days_in_year(1900), 365);
        assert_eq!(days_in_year(2000), 366);

        let (start, end) = year_bounds(2024).unwrap();
        assert_eq!(days_in_range(start, end), 366);
        assert_eq!(each_day(start, end).count(), 366);
        assert_eq!(days_in_range(end, start), 0);
    }
}
