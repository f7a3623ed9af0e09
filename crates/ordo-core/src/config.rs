// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.
//!
//! Each concern loads independently so a process only needs the variables it
//! uses: the regeneration binary needs all three sections, a cache-mode server
//! only [`DatabaseConfig`], a live-mode server only [`EngineConfig`].

use std::time::Duration;

use crate::regeneration::{CustomEditPolicy, RegenerationConfig};

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL or SQLite connection URL
    pub database_url: String,
    /// Pool size
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Load from environment variables.
    ///
    /// Required:
    /// - `ORDO_DATABASE_URL`: PostgreSQL or SQLite connection string
    ///
    /// Optional (with defaults):
    /// - `ORDO_DB_MAX_CONNECTIONS`: pool size (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("ORDO_DATABASE_URL")
            .map_err(|_| ConfigError::Missing("ORDO_DATABASE_URL"))?;

        let max_connections: u32 = std::env::var("ORDO_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::Invalid(
                "ORDO_DB_MAX_CONNECTIONS",
                "must be a positive integer",
            ))?;

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

/// Compute engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Engine executable, or `mock` for the built-in deterministic engine
    pub program: String,
    /// Leading arguments passed before the per-call arguments
    pub args: Vec<String>,
    /// Maximum time a single invocation may run
    pub timeout: Duration,
}

impl EngineConfig {
    /// Load from environment variables.
    ///
    /// Required:
    /// - `ORDO_ENGINE_PROGRAM`: engine executable (`mock` for the built-in engine)
    ///
    /// Optional (with defaults):
    /// - `ORDO_ENGINE_ARGS`: whitespace-separated leading arguments (default: none)
    /// - `ORDO_ENGINE_TIMEOUT_SECS`: per-invocation timeout (default: 120)
    pub fn from_env() -> Result<Self, ConfigError> {
        let program = std::env::var("ORDO_ENGINE_PROGRAM")
            .map_err(|_| ConfigError::Missing("ORDO_ENGINE_PROGRAM"))?;
        if program.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "ORDO_ENGINE_PROGRAM",
                "must not be empty",
            ));
        }

        let args = std::env::var("ORDO_ENGINE_ARGS")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let timeout_secs: u64 = std::env::var("ORDO_ENGINE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::Invalid(
                "ORDO_ENGINE_TIMEOUT_SECS",
                "must be a positive number of seconds",
            ))?;

        Ok(Self {
            program: program.trim().to_string(),
            args,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Whether this selects the built-in mock engine.
    pub fn is_mock(&self) -> bool {
        self.program == "mock"
    }
}

impl RegenerationConfig {
    /// Load from environment variables; every value has a default.
    ///
    /// - `ORDO_BATCH_SIZE`: rows per insert chunk (default: 50)
    /// - `ORDO_PAIR_DELAY_MS`: pause between pairs (default: 1000)
    /// - `ORDO_LEASE_TTL_SECS`: regeneration lease lifetime (default: 900)
    /// - `ORDO_CUSTOM_EDIT_POLICY`: `overwrite` or `preserve` (default: overwrite)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = RegenerationConfig::default();

        let batch_size = match std::env::var("ORDO_BATCH_SIZE") {
            Ok(v) => v.parse().ok().filter(|n| *n > 0).ok_or(ConfigError::Invalid(
                "ORDO_BATCH_SIZE",
                "must be a positive integer",
            ))?,
            Err(_) => defaults.batch_size,
        };

        let pair_delay = match std::env::var("ORDO_PAIR_DELAY_MS") {
            Ok(v) => Duration::from_millis(v.parse().map_err(|_| {
                ConfigError::Invalid("ORDO_PAIR_DELAY_MS", "must be a number of milliseconds")
            })?),
            Err(_) => defaults.pair_delay,
        };

        let lease_ttl = match std::env::var("ORDO_LEASE_TTL_SECS") {
            Ok(v) => Duration::from_secs(v.parse().ok().filter(|n| *n > 0).ok_or(
                ConfigError::Invalid("ORDO_LEASE_TTL_SECS", "must be a positive number of seconds"),
            )?),
            Err(_) => defaults.lease_ttl,
        };

        let custom_edits = match std::env::var("ORDO_CUSTOM_EDIT_POLICY") {
            Ok(v) => v.parse().map_err(|_| {
                ConfigError::Invalid("ORDO_CUSTOM_EDIT_POLICY", "must be 'overwrite' or 'preserve'")
            })?,
            Err(_) => defaults.custom_edits,
        };

        Ok(Self {
            batch_size,
            pair_delay,
            lease_ttl,
            custom_edits,
        })
    }

    /// Reject a lease that can expire while the engine is still computing.
    ///
    /// The lease is taken once per pair and never renewed, so it must outlive
    /// the longest engine call.
    pub fn check_lease_covers(&self, engine: &EngineConfig) -> Result<(), ConfigError> {
        if self.lease_ttl <= engine.timeout {
            return Err(ConfigError::Invalid(
                "ORDO_LEASE_TTL_SECS",
                "must be longer than ORDO_ENGINE_TIMEOUT_SECS",
            ));
        }
        Ok(())
    }
}

impl std::str::FromStr for CustomEditPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "preserve" => Ok(Self::Preserve),
            _ => Err(()),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that modify environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to set env vars for a test and restore them after
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::set_var(key, value) };
        }

        fn remove(&mut self, key: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::remove_var(key) };
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.vars.drain(..).rev() {
                // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
                unsafe {
                    match value {
                        Some(v) => env::set_var(&key, v),
                        None => env::remove_var(&key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_database_config_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("ORDO_DATABASE_URL", "postgres://localhost/ordo");
        guard.remove("ORDO_DB_MAX_CONNECTIONS");

        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.database_url, "postgres://localhost/ordo");
        assert_eq!(config.max_connections, 10);
    }

    #[test]
    fn test_database_config_missing_url() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.remove("ORDO_DATABASE_URL");

        let err = DatabaseConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ORDO_DATABASE_URL")));
        assert!(err.to_string().contains("ORDO_DATABASE_URL"));
    }

    #[test]
    fn test_database_config_invalid_pool_size() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("ORDO_DATABASE_URL", "sqlite::memory:");
        guard.set("ORDO_DB_MAX_CONNECTIONS", "0");
        assert!(matches!(
            DatabaseConfig::from_env().unwrap_err(),
            ConfigError::Invalid("ORDO_DB_MAX_CONNECTIONS", _)
        ));

        guard.set("ORDO_DB_MAX_CONNECTIONS", "lots");
        assert!(DatabaseConfig::from_env().is_err());
    }

    #[test]
    fn test_engine_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("ORDO_ENGINE_PROGRAM", "/usr/bin/node");
        guard.set("ORDO_ENGINE_ARGS", "  engine/cli.js   --json ");
        guard.set("ORDO_ENGINE_TIMEOUT_SECS", "30");

        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config.program, "/usr/bin/node");
        assert_eq!(config.args, vec!["engine/cli.js", "--json"]);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.is_mock());
    }

    #[test]
    fn test_engine_config_defaults_and_mock() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("ORDO_ENGINE_PROGRAM", "mock");
        guard.remove("ORDO_ENGINE_ARGS");
        guard.remove("ORDO_ENGINE_TIMEOUT_SECS");

        let config = EngineConfig::from_env().unwrap();
        assert!(config.is_mock());
        assert!(config.args.is_empty());
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_engine_config_errors() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.remove("ORDO_ENGINE_PROGRAM");
        assert!(matches!(
            EngineConfig::from_env().unwrap_err(),
            ConfigError::Missing("ORDO_ENGINE_PROGRAM")
        ));

        guard.set("ORDO_ENGINE_PROGRAM", "engine");
        guard.set("ORDO_ENGINE_TIMEOUT_SECS", "-1");
        assert!(matches!(
            EngineConfig::from_env().unwrap_err(),
            ConfigError::Invalid("ORDO_ENGINE_TIMEOUT_SECS", _)
        ));
    }

    #[test]
    fn test_regeneration_config_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.remove("ORDO_BATCH_SIZE");
        guard.remove("ORDO_PAIR_DELAY_MS");
        guard.remove("ORDO_LEASE_TTL_SECS");
        guard.remove("ORDO_CUSTOM_EDIT_POLICY");

        let config = RegenerationConfig::from_env().unwrap();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.pair_delay, Duration::from_millis(1000));
        assert_eq!(config.lease_ttl, Duration::from_secs(900));
        assert_eq!(config.custom_edits, CustomEditPolicy::Overwrite);
    }

    #[test]
    fn test_regeneration_config_custom() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("ORDO_BATCH_SIZE", "100");
        guard.set("ORDO_PAIR_DELAY_MS", "0");
        guard.set("ORDO_LEASE_TTL_SECS", "60");
        guard.set("ORDO_CUSTOM_EDIT_POLICY", "Preserve");

        let config = RegenerationConfig::from_env().unwrap();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.pair_delay, Duration::ZERO);
        assert_eq!(config.lease_ttl, Duration::from_secs(60));
        assert_eq!(config.custom_edits, CustomEditPolicy::Preserve);
    }

    #[test]
    fn test_regeneration_config_invalid() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.remove("ORDO_PAIR_DELAY_MS");
        guard.remove("ORDO_LEASE_TTL_SECS");
        guard.remove("ORDO_CUSTOM_EDIT_POLICY");
        guard.set("ORDO_BATCH_SIZE", "0");
        assert!(matches!(
            RegenerationConfig::from_env().unwrap_err(),
            ConfigError::Invalid("ORDO_BATCH_SIZE", _)
        ));

        guard.remove("ORDO_BATCH_SIZE");
        guard.set("ORDO_CUSTOM_EDIT_POLICY", "merge");
        assert!(matches!(
            RegenerationConfig::from_env().unwrap_err(),
            ConfigError::Invalid("ORDO_CUSTOM_EDIT_POLICY", _)
        ));
    }

    #[test]
    fn test_config_error_display() {
        let missing = ConfigError::Missing("MY_VAR");
        assert_eq!(
            missing.to_string(),
            "missing required environment variable: MY_VAR"
        );

        let invalid = ConfigError::Invalid("MY_VAR", "must be a number");
        assert_eq!(
            invalid.to_string(),
            "invalid value for MY_VAR: must be a number"
        );
    }

    #[test]
    fn test_lease_must_outlive_engine_timeout() {
        let engine = EngineConfig {
            program: "mock".to_string(),
            args: vec![],
            timeout: Duration::from_secs(120),
        };
        let mut config = RegenerationConfig::default();
        assert!(config.check_lease_covers(&engine).is_ok());

        config.lease_ttl = Duration::from_secs(120);
        assert!(matches!(
            config.check_lease_covers(&engine),
            Err(ConfigError::Invalid("ORDO_LEASE_TTL_SECS", _))
        ));

        config.lease_ttl = Duration::from_secs(60);
        assert!(config.check_lease_covers(&engine).is_err());
    }
}
