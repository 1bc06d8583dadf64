//! Parse human-authored duty-rate expressions into a typed rate
//!
//! Schedules carry rates such as "Free", "5.5%", "25¢/kg" or "$2.50 each",
//! often with footnotes or conditions attached. Anything the parser does not
//! recognize is treated as Free.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static PERCENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)%").expect("percent pattern"));

static CENTS_PER_KG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)¢?/kg").expect("cents/kg pattern"));

static DOLLARS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+\.?\d*)").expect("dollars pattern"));

/// Unit system a duty amount is computed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateKind {
    /// No duty
    Free,
    /// Percentage points of the CIF value
    Percentage,
    /// Cents per kilogram of total shipment weight
    #[serde(rename = "cents_per_kg")]
    CentsPerKilogram,
    /// Dollars per unit shipped
    DollarsPerUnit,
}

impl RateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateKind::Free => "free",
            RateKind::Percentage => "percentage",
            RateKind::CentsPerKilogram => "cents_per_kg",
            RateKind::DollarsPerUnit => "dollars_per_unit",
        }
    }
}

impl fmt::Display for RateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized duty rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub kind: RateKind,
    /// Percentage points, cents per kg, or dollars per unit depending on `kind`
    pub value: f64,
}

impl Rate {
    pub fn free() -> Self {
        Self {
            kind: RateKind::Free,
            value: 0.0,
        }
    }

    /// Build a rate; a Free kind always carries a zero value
    pub fn new(kind: RateKind, value: f64) -> Self {
        match kind {
            RateKind::Free => Self::free(),
            _ => Self { kind, value },
        }
    }

    pub fn is_free(&self) -> bool {
        self.kind == RateKind::Free
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self::free()
    }
}

/// Parse a raw rate expression. Never fails.
///
/// Checks run in priority order, first match wins:
/// 1. empty, contains "free", or exactly "0" -> Free
/// 2. `<number>%` -> Percentage
/// 3. `<number>[¢]/kg` -> CentsPerKilogram
/// 4. `$<number>` anywhere -> DollarsPerUnit
/// 5. anything else -> Free
///
/// A string matching more than one pattern takes the earliest rule.
pub fn parse_rate(raw: Option<&str>) -> Rate {
    let text = match raw {
        Some(text) => text.trim().to_lowercase(),
        None => return Rate::free(),
    };

    if text.is_empty() || text.contains("free") || text == "0" {
        return Rate::free();
    }

    let patterns: [(&Regex, RateKind); 3] = [
        (&*PERCENT_PATTERN, RateKind::Percentage),
        (&*CENTS_PER_KG_PATTERN, RateKind::CentsPerKilogram),
        (&*DOLLARS_PATTERN, RateKind::DollarsPerUnit),
    ];

    for (pattern, kind) in patterns {
        if let Some(value) = capture_number(pattern, &text) {
            return Rate::new(kind, value);
        }
    }

    Rate::free()
}

fn capture_number(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}
