// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! API error type and JSON error bodies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ordo_core::OrdoError;
use serde::Serialize;

/// Error returned by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A request parameter is missing or malformed.
    #[error("{0}")]
    BadRequest(String),

    /// Error from the read service.
    #[error(transparent)]
    Ordo(#[from] OrdoError),
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Ordo(err) => match err {
                OrdoError::Validation { .. } => StatusCode::BAD_REQUEST,
                OrdoError::NotFound(_) => StatusCode::NOT_FOUND,
                OrdoError::LeaseUnavailable { .. } => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "VALIDATION_ERROR",
            Self::Ordo(err) => err.error_code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let error = match &self {
            Self::Ordo(err @ OrdoError::Compute(_)) => {
                tracing::error!(error = %err, "calendar computation failed");
                "Calendar computation failed".to_string()
            }
            Self::Ordo(err) if status.is_server_error() => {
                tracing::error!(error = %err, code, "internal error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { error, code })).into_response()
    }
}
