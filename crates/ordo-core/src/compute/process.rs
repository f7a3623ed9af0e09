// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Process-backed compute engine.
//!
//! Runs the configured program once per call:
//!
//! ```text
//! <program> <configured args...> --locale <code> --start <YYYY-MM-DD> --end <YYYY-MM-DD>
//! ```
//!
//! Arguments are passed as discrete argv entries; nothing is interpolated into a
//! shell or script. The program must print a JSON array of day objects (or an
//! object with a `days` array) on stdout. Diagnostic lines before the JSON payload
//! and anything on stderr are tolerated and logged at debug level.

use std::process::Stdio;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{ComputeEngine, ComputeError, DayRecord, verify_coverage};
use crate::config::EngineConfig;
use crate::locale::Locale;

/// Engine that shells out to an external program (without a shell).
pub struct ProcessEngine {
    config: EngineConfig,
}

impl ProcessEngine {
    /// Create a new process engine.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    fn command(&self, locale: Locale, start: NaiveDate, end: NaiveDate) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args);
        cmd.arg("--locale").arg(locale.code());
        cmd.arg("--start").arg(start.format("%Y-%m-%d").to_string());
        cmd.arg("--end").arg(end.format("%Y-%m-%d").to_string());
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ComputeEngine for ProcessEngine {
    fn engine_type(&self) -> &'static str {
        "process"
    }

    async fn compute_range(
        &self,
        locale: Locale,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DayRecord>, ComputeError> {
        if start > end {
            return Err(ComputeError::InvalidRange { start, end });
        }

        let started = std::time::Instant::now();
        debug!(
            program = %self.config.program,
            locale = %locale,
            start = %start,
            end = %end,
            "Invoking compute engine"
        );

        // kill_on_drop reaps the child when the timeout drops the future
        let output = tokio::time::timeout(self.config.timeout, self.command(locale, start, end).output())
            .await
            .map_err(|_| {
                warn!(locale = %locale, start = %start, end = %end, "Compute engine timed out");
                ComputeError::Timeout(self.config.timeout)
            })??;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(ComputeError::ExitCode {
                exit_code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }
        if !stderr.is_empty() {
            debug!(locale = %locale, diagnostics = %stderr, "Engine diagnostics on stderr");
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| ComputeError::Malformed(format!("engine output is not valid UTF-8: {}", e)))?;
        let mut records = parse_engine_output(&stdout)?;
        verify_coverage(start, end, &mut records)?;

        debug!(
            locale = %locale,
            days = records.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Compute engine finished"
        );
        Ok(records)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnginePayload {
    Days(Vec<DayRecord>),
    Wrapped { days: Vec<DayRecord> },
}

/// Parse engine stdout into day records.
///
/// Every line that opens a JSON array or object is a payload candidate; the first
/// candidate that deserializes into day records wins. Other lines, including log
/// lines such as `[info] ...` or `{"level":"warn",...}`, are diagnostics. Text
/// after the payload is ignored.
pub fn parse_engine_output(stdout: &str) -> Result<Vec<DayRecord>, ComputeError> {
    if stdout.trim().is_empty() {
        return Err(ComputeError::EmptyOutput);
    }

    let mut offset = 0;
    let mut last_error = None;
    for line in stdout.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            let start = offset + (line.len() - trimmed.len());
            let mut stream =
                serde_json::Deserializer::from_str(&stdout[start..]).into_iter::<EnginePayload>();
            match stream.next() {
                Some(Ok(EnginePayload::Days(days))) | Some(Ok(EnginePayload::Wrapped { days })) => {
                    return Ok(days);
                }
                Some(Err(e)) => {
                    debug!(line = %trimmed.trim_end(), error = %e, "Ignoring engine diagnostic line");
                    last_error = Some(e.to_string());
                }
                None => {}
            }
        } else if !trimmed.is_empty() {
            debug!(line = %trimmed.trim_end(), "Ignoring engine diagnostic line");
        }
        offset += line.len();
    }

    Err(ComputeError::Malformed(last_error.unwrap_or_else(|| {
        "no JSON payload found in engine output".to_string()
    })))
}
