// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Ordo Server - HTTP read API for liturgical calendar data.
//!
//! Serves `GET /api/calendar` from one of the two ordo-core readers, chosen per
//! deployment with `ORDO_READ_MODE`:
//!
//! - `cache`: precomputed rows only; unknown days are 404 until `ordo-regen` fills them
//! - `live`: every request computes through the engine
//!
//! # Architecture
//!
//! - **AppState**: the selected [`CalendarReader`](ordo_core::read::CalendarReader) and mode
//! - **Routes**: calendar query and health endpoints
//! - **ApiError**: maps ordo-core error codes to HTTP statuses

mod config;
mod error;
mod routes;
mod state;

pub use self::config::{ReadMode, ServerConfig};
pub use self::error::ApiError;
pub use self::routes::{CalendarAction, CalendarQuery, router};
pub use self::state::AppState;
