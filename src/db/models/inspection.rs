//! Inspection log data models.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::inspection::Outcome;

/// One persisted comparison. Never updated after it is written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub code_a: String,
    pub code_b: String,
    pub outcome: Outcome,
}

/// A record awaiting its store-assigned id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewInspection {
    pub timestamp: DateTime<Utc>,
    pub code_a: String,
    pub code_b: String,
    pub outcome: Outcome,
}

impl NewInspection {
    /// Stamps the inspection with the current time.
    ///
    /// The timestamp is truncated to microseconds, the precision the store
    /// keeps, so the record read back compares equal to the one written.
    pub fn captured_now(code_a: &str, code_b: &str, outcome: Outcome) -> Self {
        Self {
            timestamp: Utc::now().trunc_subsecs(6),
            code_a: code_a.to_string(),
            code_b: code_b.to_string(),
            outcome,
        }
    }

    pub fn into_record(self, id: i64) -> InspectionRecord {
        InspectionRecord {
            id,
            timestamp: self.timestamp,
            code_a: self.code_a,
            code_b: self.code_b,
            outcome: self.outcome,
        }
    }
}
