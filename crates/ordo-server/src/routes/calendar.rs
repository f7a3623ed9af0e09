// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Calendar query endpoint.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use ordo_core::Locale;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for `GET /api/calendar`.
///
/// Values are taken as strings so every parse failure gets a JSON 400 naming
/// the parameter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarQuery {
    /// One of `day`, `month`, `year`, `lectionary`.
    pub action: Option<String>,
    /// Calendar year (all actions).
    pub year: Option<String>,
    /// Month 1-12 (`day`, `month`).
    pub month: Option<String>,
    /// Day of month (`day`).
    pub day: Option<String>,
    /// Locale code (default: en).
    pub lang: Option<String>,
}

/// Requested action with its validated parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarAction {
    /// One day.
    Day {
        /// Locale.
        locale: Locale,
        /// Date.
        date: chrono::NaiveDate,
    },
    /// One month.
    Month {
        /// Locale.
        locale: Locale,
        /// Year.
        year: i32,
        /// Month number.
        month: u32,
    },
    /// One year.
    Year {
        /// Locale.
        locale: Locale,
        /// Year.
        year: i32,
    },
    /// Cycle labels.
    Lectionary {
        /// Year.
        year: i32,
    },
}

impl CalendarQuery {
    /// Validate the parameters for the requested action.
    pub fn parse(&self) -> Result<CalendarAction, ApiError> {
        let action = self
            .action
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| ApiError::BadRequest("missing required parameter 'action'".into()))?;

        let year: i32 = required(&self.year, "year")?;

        match action {
            "lectionary" => Ok(CalendarAction::Lectionary { year }),
            "year" => Ok(CalendarAction::Year {
                locale: self.locale()?,
                year,
            }),
            "month" => {
                let month: u32 = required(&self.month, "month")?;
                let locale = self.locale()?;
                ordo_core::dates::month_bounds(year, month)?;
                Ok(CalendarAction::Month {
                    locale,
                    year,
                    month,
                })
            }
            "day" => {
                let month: u32 = required(&self.month, "month")?;
                let day: u32 = required(&self.day, "day")?;
                let locale = self.locale()?;
                let date = ordo_core::dates::date_from_parts(year, month, day)?;
                Ok(CalendarAction::Day { locale, date })
            }
            other => Err(ApiError::BadRequest(format!(
                "invalid action '{}'. Valid options: day, month, year, lectionary",
                other
            ))),
        }
    }

    fn locale(&self) -> Result<Locale, ApiError> {
        match self.lang.as_deref().map(str::trim) {
            None | Some("") => Ok(Locale::En),
            Some(code) => Ok(code.parse::<Locale>().map_err(ordo_core::OrdoError::from)?),
        }
    }
}

fn required<T: std::str::FromStr>(value: &Option<String>, name: &str) -> Result<T, ApiError> {
    let raw = value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("missing required parameter '{}'", name)))?;
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid value for '{}': '{}'", name, raw)))
}

/// `GET /api/calendar?action=...`
///
/// Serves day, month, year and lectionary queries from the configured reader.
pub async fn get_calendar(
    State(state): State<AppState>,
    Query(params): Query<CalendarQuery>,
) -> Result<Response, ApiError> {
    let reader = &state.reader;

    let response = match params.parse()? {
        CalendarAction::Day { locale, date } => Json(reader.day(locale, date).await?).into_response(),
        CalendarAction::Month {
            locale,
            year,
            month,
        } => Json(reader.month(locale, year, month).await?).into_response(),
        CalendarAction::Year { locale, year } => {
            Json(reader.year(locale, year).await?).into_response()
        }
        CalendarAction::Lectionary { year } => Json(reader.lectionary(year).await?).into_response(),
    };

    Ok(response)
}
