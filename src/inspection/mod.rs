//! Comparison of two scanned identifiers.
//!
//! A reading is trimmed of surrounding whitespace and then compared byte for
//! byte. No case folding or other normalization is applied.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Match,
    Mismatch,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Match => "Match",
            Outcome::Mismatch => "Mismatch",
        }
    }

    /// Short label shown to operators and written to exported sheets.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Match => "OK",
            Outcome::Mismatch => "NG",
        }
    }
}

/// Trims a raw reading, returning `None` when nothing is left.
pub fn normalize(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Classifies two already-normalized codes.
pub fn classify(code_a: &str, code_b: &str) -> Outcome {
    if code_a == code_b {
        Outcome::Match
    } else {
        Outcome::Mismatch
    }
}
