// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! ordo-regen - batch regeneration of precomputed calendar data.
//!
//! ```bash
//! # One year, every locale
//! ordo-regen run --years 2025
//!
//! # A range of years for two locales, keeping hand-edited days
//! ordo-regen run --years 2025-2030 --locales en,es --preserve-custom-edits
//!
//! # What is stored
//! ordo-regen status --locale en
//! ```
//!
//! Settings come from `ORDO_*` environment variables (a `.env` file is honoured);
//! flags override the regeneration settings.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use ordo_core::Locale;
use ordo_core::compute::engine_from_config;
use ordo_core::config::{DatabaseConfig, EngineConfig};
use ordo_core::persistence::{self, CalendarStore};
use ordo_core::regeneration::{
    CustomEditPolicy, RegenerationConfig, RegenerationPlan, Regenerator, YearSpec,
};

/// Regenerate precomputed liturgical calendar data
#[derive(Parser)]
#[command(name = "ordo-regen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute and store every day of the given years
    Run {
        /// Year or inclusive range: 2025, 2025-2030 or 2025..2030
        #[arg(short, long)]
        years: YearSpec,

        /// Comma-separated locales (default: all supported)
        #[arg(short, long)]
        locales: Option<String>,

        /// Rows per insert statement
        #[arg(long)]
        batch_size: Option<usize>,

        /// Pause between (locale, year) pairs in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Keep hand-edited days instead of overwriting them
        #[arg(long)]
        preserve_custom_edits: bool,
    },
    /// List stored years and their day counts
    Status {
        /// Only show this locale
        #[arg(short, long)]
        locale: Option<Locale>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file (from crate directory or parent directories)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ordo_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let db_config = DatabaseConfig::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    info!("Connecting to database...");
    let store = persistence::connect(&db_config).await?;
    if !store.health_check_db().await? {
        anyhow::bail!("database health check failed");
    }
    info!(backend = store.backend(), "Database ready");

    let code = match cli.command {
        Commands::Run {
            years,
            locales,
            batch_size,
            delay_ms,
            preserve_custom_edits,
        } => {
            let mut config = RegenerationConfig::from_env()?;
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size.max(1);
            }
            if let Some(delay_ms) = delay_ms {
                config.pair_delay = Duration::from_millis(delay_ms);
            }
            if preserve_custom_edits {
                config.custom_edits = CustomEditPolicy::Preserve;
            }

            let plan = match locales {
                Some(list) => RegenerationPlan {
                    years,
                    locales: Locale::parse_list(&list)?,
                },
                None => RegenerationPlan::all_locales(years),
            };
            if plan.locales.is_empty() {
                anyhow::bail!("--locales must name at least one locale");
            }

            let engine_config = EngineConfig::from_env()?;
            config.check_lease_covers(&engine_config)?;
            let engine = engine_from_config(&engine_config);
            info!(
                engine = engine.engine_type(),
                program = %engine_config.program,
                timeout_secs = engine_config.timeout.as_secs(),
                "Engine configured"
            );

            let regenerator = Regenerator::new(store.clone(), engine, config);

            tokio::select! {
                summary = regenerator.run(&plan) => {
                    println!("{}", summary);
                    if summary.all_succeeded() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    // The interrupted pair's lease stays until it expires
                    warn!(holder = regenerator.holder(), "Interrupted, stopping regeneration");
                    ExitCode::from(130)
                }
            }
        }
        Commands::Status { locale } => {
            print_status(store.as_ref(), locale).await?;
            ExitCode::SUCCESS
        }
    };

    store.close().await;
    Ok(code)
}

async fn print_status(store: &dyn CalendarStore, locale: Option<Locale>) -> Result<()> {
    let years = store.list_liturgical_years(locale).await?;
    if years.is_empty() {
        println!("No calendar years stored");
        return Ok(());
    }

    println!(
        "{:<6} {:<6} {:<10} {:<6} {:>9}  UPDATED",
        "LOCALE", "YEAR", "LECTIONARY", "FERIAL", "DAYS"
    );
    for year in years {
        let locale: Locale = year.locale.parse()?;
        let (start, end) = ordo_core::dates::year_bounds(year.year)?;
        let stored = store.count_days(locale, start, end).await?;
        let expected = ordo_core::dates::days_in_year(year.year);
        println!(
            "{:<6} {:<6} {:<10} {:<6} {:>4}/{:<4}  {}",
            year.locale,
            year.year,
            year.lectionary_cycle,
            year.ferial_cycle,
            stored,
            expected,
            year.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}
