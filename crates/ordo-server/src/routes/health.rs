// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    mode: &'static str,
    version: &'static str,
}

/// `GET /health`
///
/// In cache mode the database is checked and an unreachable database is a 503.
/// Live mode has no backing resource to probe.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let ready = match state.reader.ready().await {
        Ok(ready) => ready,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            false
        }
    };

    let (status, label) = if ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            mode: state.mode.as_str(),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
