// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared application state.

use std::sync::Arc;

use ordo_core::read::CalendarReader;

use crate::config::ReadMode;

/// State available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Reader selected for this deployment.
    pub reader: Arc<dyn CalendarReader>,
    /// Mode the reader was selected for.
    pub mode: ReadMode,
}

impl AppState {
    /// Create the state for a reader.
    pub fn new(reader: Arc<dyn CalendarReader>, mode: ReadMode) -> Self {
        Self { reader, mode }
    }
}
