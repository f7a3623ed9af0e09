// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Ordo Core - Liturgical Calendar Precomputation
//!
//! This crate drives an external, deterministic liturgical computation engine to
//! precompute per-day calendar metadata (season, week, weekday, celebrations) for
//! every (locale, year) pair, persists it, and serves it back through two read
//! paths that share one response schema.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────────────┐               ┌──────────────────────────────┐
//!  │      ordo-regen      │               │         ordo-server          │
//!  │ (batch regeneration) │               │   GET /api/calendar?action=  │
//!  └──────────┬───────────┘               └──────────────┬───────────────┘
//!             │                                          │
//!             ▼                                          ▼
//!  ┌──────────────────────┐               ┌──────────────────────────────┐
//!  │     Regenerator      │               │        CalendarReader        │
//!  │ lease → upsert year  │               │  CacheReader  │  LiveReader  │
//!  │ → delete → compute   │               └───────┬───────┴──────┬───────┘
//!  │ → chunked insert     │                       │              │
//!  └─────┬──────────┬─────┘                       │              │
//!        │          │                             │              │
//!        │          ▼                             │              ▼
//!        │   ┌──────────────┐                     │      ┌──────────────┐
//!        │   │ComputeEngine │◄────────────────────┼──────│ ComputeEngine│
//!        │   └──────────────┘                     │      └──────────────┘
//!        ▼                                        ▼
//!  ┌──────────────────────────────────────────────────────┐
//!  │       CalendarStore (PostgreSQL or SQLite)           │
//!  │  liturgical_years · calendar_days · leases           │
//!  └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Regeneration
//!
//! For each requested (locale, year) pair the [`regeneration::Regenerator`]:
//!
//! 1. Acquires a per-(locale, year) lease so two runs never interleave
//! 2. Upserts the [`LiturgicalYear`](persistence::LiturgicalYearRecord) row with its cycles
//! 3. Deletes the year's day rows for that locale (aborts the pair on failure)
//! 4. Computes the whole year through the [`compute::ComputeEngine`]
//! 5. Inserts the rows in fixed-size chunks; a failed chunk does not stop the others
//!
//! Pairs are isolated: one failing pair never aborts the run, and the run always
//! ends with a per-pair [`regeneration::RunSummary`].
//!
//! # Read Modes
//!
//! | Mode | Reader | Source | On miss |
//! |------|--------|--------|---------|
//! | `cache` | [`read::CacheReader`] | store only | `NotFound` |
//! | `live` | [`read::LiveReader`] | engine per request | n/a |
//!
//! # Modules
//!
//! - [`config`]: Configuration from environment variables
//! - [`compute`]: Compute engine client (process-backed and mock)
//! - [`cycle`]: Lectionary and ferial cycle calculator
//! - [`dates`]: Calendar range helpers
//! - [`error`]: Error types with stable error codes
//! - [`locale`]: Supported locale set
//! - [`persistence`]: Store trait with PostgreSQL and SQLite backends
//! - [`read`]: Cache-only and live read services
//! - [`regeneration`]: Batch regeneration orchestrator

#![deny(missing_docs)]

/// Configuration loaded from environment variables.
pub mod config;

/// Adapter to the external liturgical computation engine.
pub mod compute;

/// Lectionary and ferial cycle calculator.
pub mod cycle;

/// Calendar range helpers.
pub mod dates;

/// Error types with stable error codes.
pub mod error;

/// Supported locales.
pub mod locale;

/// Embedded database migrations.
pub mod migrations;

/// Store interface and database backends.
pub mod persistence;

/// Read services (cache-only and live).
pub mod read;

/// Batch regeneration orchestrator.
pub mod regeneration;

pub use error::{OrdoError, Result};
pub use locale::Locale;
