// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Per-pair outcomes and the run summary.

use std::fmt;
use std::time::Duration;

use crate::locale::Locale;

/// A chunk insert that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    /// 1-based chunk number within the pair.
    pub index: usize,
    /// Rows in the chunk.
    pub rows: usize,
    /// Error message from the store.
    pub error: String,
}

/// Final state of one (locale, year) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairStatus {
    /// Every row was saved.
    Succeeded,
    /// Some chunks failed; the rest were saved.
    Partial,
    /// Nothing (or nothing new) was saved.
    Failed {
        /// What went wrong.
        reason: String,
    },
}

impl PairStatus {
    /// Short label for tables and logs.
    pub fn label(&self) -> &'static str {
        match self {
            PairStatus::Succeeded => "ok",
            PairStatus::Partial => "partial",
            PairStatus::Failed { .. } => "failed",
        }
    }
}

/// Outcome of regenerating one (locale, year) pair.
#[derive(Debug, Clone)]
pub struct PairOutcome {
    /// Locale of the pair.
    pub locale: Locale,
    /// Year of the pair.
    pub year: i32,
    /// Final state.
    pub status: PairStatus,
    /// Rows removed before inserting.
    pub deleted: u64,
    /// Rows inserted.
    pub saved: u64,
    /// Rows the pair tried to insert.
    pub total: usize,
    /// Dates skipped because they keep a custom edit.
    pub preserved: usize,
    /// Chunks that failed to insert.
    pub chunk_failures: Vec<ChunkFailure>,
    /// Wall time spent on the pair.
    pub duration: Duration,
}

impl PairOutcome {
    pub(crate) fn pending(locale: Locale, year: i32) -> Self {
        Self {
            locale,
            year,
            status: PairStatus::Failed {
                reason: "not started".to_string(),
            },
            deleted: 0,
            saved: 0,
            total: 0,
            preserved: 0,
            chunk_failures: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Whether every row of the pair was saved.
    pub fn is_success(&self) -> bool {
        self.status == PairStatus::Succeeded
    }
}

/// Outcomes of a whole run, in processing order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// One entry per pair.
    pub outcomes: Vec<PairOutcome>,
}

impl RunSummary {
    /// True when every pair succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(PairOutcome::is_success)
    }

    /// Number of fully successful pairs.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of pairs that did not fully succeed.
    pub fn unsuccessful(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Total rows saved across pairs.
    pub fn rows_saved(&self) -> u64 {
        self.outcomes.iter().map(|o| o.saved).sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<6} {:<6} {:<8} {:>7} {:>7} {:>8}  DETAIL",
            "LOCALE", "YEAR", "STATUS", "SAVED", "TOTAL", "TIME"
        )?;
        for o in &self.outcomes {
            let detail = match &o.status {
                PairStatus::Failed { reason } => reason.clone(),
                PairStatus::Partial => o
                    .chunk_failures
                    .iter()
                    .map(|c| format!("chunk {} ({} rows): {}", c.index, c.rows, c.error))
                    .collect::<Vec<_>>()
                    .join("; "),
                PairStatus::Succeeded if o.preserved > 0 => {
                    format!("{} custom edits kept", o.preserved)
                }
                PairStatus::Succeeded => String::new(),
            };
            writeln!(
                f,
                "{:<6} {:<6} {:<8} {:>7} {:>7} {:>7.1}s  {}",
                o.locale.code(),
                o.year,
                o.status.label(),
                o.saved,
                o.total,
                o.duration.as_secs_f64(),
                detail
            )?;
        }
        write!(
            f,
            "{} of {} pairs succeeded, {} rows saved",
            self.succeeded(),
            self.outcomes.len(),
            self.rows_saved()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(locale: Locale, status: PairStatus, saved: u64) -> PairOutcome {
        PairOutcome {
            status,
            saved,
            total: 365,
            ..PairOutcome::pending(locale, 2025)
        }
    }

    #[test]
    fn test_summary_counts() {
        let summary = RunSummary {
            outcomes: vec![
                outcome(Locale::En, PairStatus::Succeeded, 365),
                outcome(Locale::Es, PairStatus::Partial, 315),
                outcome(
                    Locale::La,
                    PairStatus::Failed {
                        reason: "engine down".to_string(),
                    },
                    0,
                ),
            ],
        };
        assert!(!summary.all_succeeded());
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.unsuccessful(), 2);
        assert_eq!(summary.rows_saved(), 680);

        assert!(RunSummary::default().all_succeeded());
    }

    #[test]
    fn test_summary_table() {
        let mut partial = outcome(Locale::Es, PairStatus::Partial, 315);
        partial.chunk_failures.push(ChunkFailure {
            index: 5,
            rows: 50,
            error: "disk full".to_string(),
        });
        let summary = RunSummary {
            outcomes: vec![outcome(Locale::En, PairStatus::Succeeded, 365), partial],
        };

        let table = summary.to_string();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("LOCALE"));
        assert!(lines[1].starts_with("en"));
        assert!(lines[2].contains("partial"));
        assert!(lines[2].contains("chunk 5 (50 rows): disk full"));
        assert_eq!(lines[3], "1 of 2 pairs succeeded, 680 rows saved");
    }
}
