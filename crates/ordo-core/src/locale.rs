// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Supported locale codes.
//!
//! A locale selects the language and regional tradition the engine computes for.
//! Only codes in [`Locale::ALL`] can be represented, so an unsupported code is
//! rejected at parse time, before any store or engine access.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A supported locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English
    En,
    /// Spanish
    Es,
    /// French
    Fr,
    /// Italian
    It,
    /// Portuguese
    Pt,
    /// German
    De,
    /// Polish
    Pl,
    /// Latin
    La,
}

impl Locale {
    /// Every supported locale, in default regeneration order.
    pub const ALL: [Locale; 8] = [
        Locale::En,
        Locale::Es,
        Locale::Fr,
        Locale::It,
        Locale::Pt,
        Locale::De,
        Locale::Pl,
        Locale::La,
    ];

    /// The short code stored in the database and passed to the engine.
    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
            Locale::Fr => "fr",
            Locale::It => "it",
            Locale::Pt => "pt",
            Locale::De => "de",
            Locale::Pl => "pl",
            Locale::La => "la",
        }
    }

    /// Parse a comma-separated locale list (e.g. `"en, es"`).
    ///
    /// Duplicates are dropped, order is kept.
    pub fn parse_list(input: &str) -> Result<Vec<Locale>, UnsupportedLocale> {
        let mut locales = Vec::new();
        for part in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let locale: Locale = part.parse()?;
            if !locales.contains(&locale) {
                locales.push(locale);
            }
        }
        Ok(locales)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Locale::ALL
            .into_iter()
            .find(|locale| locale.code() == code)
            .ok_or_else(|| UnsupportedLocale(s.to_string()))
    }
}

/// A locale code outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale '{0}' (supported: en, es, fr, it, pt, de, pl, la)")]
pub struct UnsupportedLocale(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_codes() {
        for locale in Locale::ALL {
            assert_eq!(locale.code().parse::<Locale>().unwrap(), locale);
        }
        assert_eq!(" EN ".parse::<Locale>().unwrap(), Locale::En);
    }

    #[test]
    fn test_parse_unsupported_code() {
        let err = "en-US".parse::<Locale>().unwrap_err();
        assert_eq!(err, UnsupportedLocale("en-US".to_string()));
        assert!(err.to_string().contains("en-US"));

        assert!("".parse::<Locale>().is_err());
        assert!("en;rm -rf".parse::<Locale>().is_err());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            Locale::parse_list("en, es,en").unwrap(),
            vec![Locale::En, Locale::Es]
        );
        assert!(Locale::parse_list("").unwrap().is_empty());
        assert!(Locale::parse_list("en,zz").is_err());
    }

    #[test]
    fn test_serde_uses_code() {
        assert_eq!(serde_json::to_string(&Locale::Pl).unwrap(), "\"pl\"");
        let parsed: Locale = serde_json::from_str("\"la\"").unwrap();
        assert_eq!(parsed, Locale::La);
    }
}
