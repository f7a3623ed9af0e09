// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! API route definitions.

mod calendar;
mod health;

pub use calendar::{CalendarAction, CalendarQuery};

use axum::Router;
use axum::routing::get;

use crate::state::AppState;

/// Build the complete API router.
///
/// - `GET /health` - Health check with the read mode
/// - `GET /api/calendar?action=day|month|year|lectionary&year=&month=&day=&lang=` - Calendar queries
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/calendar", get(calendar::get_calendar))
        .with_state(state)
}
