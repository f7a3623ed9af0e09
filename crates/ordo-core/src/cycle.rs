// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lectionary and ferial cycle calculator.
//!
//! Sunday readings rotate over a three-year cycle (A, B, C) and weekday readings
//! over a two-year cycle (1, 2). Both are pure functions of the calendar year.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Three-year Sunday lectionary cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LectionaryCycle {
    /// Year A
    A,
    /// Year B
    B,
    /// Year C
    C,
}

impl LectionaryCycle {
    /// Single-letter label, as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }
}

impl fmt::Display for LectionaryCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two-year weekday (ferial) lectionary cycle. Serialized as the number 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FerialCycle {
    /// Cycle 1 (odd years)
    One,
    /// Cycle 2 (even years)
    Two,
}

impl FerialCycle {
    /// Numeric label (1 or 2).
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl From<FerialCycle> for u8 {
    fn from(cycle: FerialCycle) -> Self {
        cycle.as_u8()
    }
}

impl TryFrom<u8> for FerialCycle {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(format!("invalid ferial cycle {}", other)),
        }
    }
}

impl fmt::Display for FerialCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Cycle labels for one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearCycles {
    /// Calendar year.
    pub year: i32,
    /// Sunday cycle.
    pub lectionary: LectionaryCycle,
    /// Weekday cycle.
    pub ferial: FerialCycle,
}

/// Sunday cycle for a calendar year: `[A, B, C][year mod 3]`.
pub fn lectionary_cycle(year: i32) -> LectionaryCycle {
    match year.rem_euclid(3) {
        0 => LectionaryCycle::A,
        1 => LectionaryCycle::B,
        _ => LectionaryCycle::C,
    }
}

/// Weekday cycle for a calendar year: 2 for even years, 1 for odd years.
pub fn ferial_cycle(year: i32) -> FerialCycle {
    if year.rem_euclid(2) == 0 {
        FerialCycle::Two
    } else {
        FerialCycle::One
    }
}

/// Both cycle labels for a calendar year.
pub fn cycles_for_year(year: i32) -> YearCycles {
    YearCycles {
        year,
        lectionary: lectionary_cycle(year),
        ferial: ferial_cycle(year),
    }
}
