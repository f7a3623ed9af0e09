// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for ordo-core.
//!
//! Provides a unified error type with stable error codes that the HTTP layer maps
//! to status codes.

use thiserror::Error;

use crate::compute::ComputeError;
use crate::config::ConfigError;
use crate::locale::UnsupportedLocale;

/// Result type using OrdoError.
pub type Result<T> = std::result::Result<T, OrdoError>;

/// Errors that can occur while regenerating or reading calendar data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OrdoError {
    /// Input validation failed (bad parameters, unsupported locale).
    #[error("Validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// The validation error message.
        message: String,
    },

    /// The compute engine failed or returned malformed output.
    #[error("Compute error: {0}")]
    Compute(#[from] ComputeError),

    /// Store operation failed.
    #[error("Database error during '{operation}': {details}")]
    Store {
        /// The operation that failed.
        operation: String,
        /// Error details.
        details: String,
    },

    /// No stored data for the requested key.
    #[error("{0} not found")]
    NotFound(String),

    /// Another run holds the regeneration lease for this pair.
    #[error("Regeneration of {locale} {year} is already in progress")]
    LeaseUnavailable {
        /// Locale code of the pair.
        locale: String,
        /// Year of the pair.
        year: i32,
    },

    /// Configuration loading failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl OrdoError {
    /// Build a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build a store error tagged with the failing operation.
    pub fn store(operation: &str, err: impl std::fmt::Display) -> Self {
        Self::Store {
            operation: operation.to_string(),
            details: err.to_string(),
        }
    }

    /// Get the error code string for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Compute(_) => "COMPUTE_ERROR",
            Self::Store { .. } => "STORE_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::LeaseUnavailable { .. } => "LEASE_UNAVAILABLE",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<sqlx::Error> for OrdoError {
    fn from(err: sqlx::Error) -> Self {
        OrdoError::store("query", err)
    }
}

impl From<sqlx::migrate::MigrateError> for OrdoError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        OrdoError::store("migrate", err)
    }
}

impl From<UnsupportedLocale> for OrdoError {
    fn from(err: UnsupportedLocale) -> Self {
        OrdoError::validation("lang", err.to_string())
    }
}
