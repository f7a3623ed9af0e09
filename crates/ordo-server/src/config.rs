// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Server configuration loaded from environment variables.

use std::fmt;
use std::str::FromStr;

use ordo_core::config::ConfigError;

/// Which reader a deployment serves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Precomputed rows only; a miss is a 404.
    #[default]
    Cache,
    /// Compute every request with the engine.
    Live,
}

impl ReadMode {
    /// Configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadMode::Cache => "cache",
            ReadMode::Live => "live",
        }
    }
}

impl fmt::Display for ReadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cache" => Ok(ReadMode::Cache),
            "live" => Ok(ReadMode::Live),
            _ => Err(ConfigError::Invalid(
                "ORDO_READ_MODE",
                "must be 'cache' or 'live'",
            )),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
    /// Read mode for this deployment
    pub read_mode: ReadMode,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `ORDO_BIND_ADDR`: listen address (default: "0.0.0.0:8080")
    /// - `ORDO_READ_MODE`: `cache` or `live` (default: cache)
    ///
    /// The database and engine sections are loaded separately, only for the
    /// mode that needs them.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr =
            std::env::var("ORDO_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let read_mode = match std::env::var("ORDO_READ_MODE") {
            Ok(v) => v.parse()?,
            Err(_) => ReadMode::default(),
        };

        Ok(Self {
            bind_addr,
            read_mode,
        })
    }
}
