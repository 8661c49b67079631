use serde::{Deserialize, Serialize};

use crate::inspection::Outcome;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Idle,
    AwaitingSecond,
    Classified,
}

impl Default for SessionPhase {
    fn default() -> Self {
        SessionPhase::Idle
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub phase: SessionPhase,
    /// First reading exactly as submitted; trimmed only when the pair is compared.
    pub first_code: Option<String>,
    pub last_outcome: Option<Outcome>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds the first reading. A repeated first scan replaces the held one.
    pub fn accept_first(&mut self, raw: &str) {
        self.phase = SessionPhase::AwaitingSecond;
        self.first_code = Some(raw.to_string());
    }

    pub fn take_first(&mut self) -> Option<String> {
        self.first_code.take()
    }

    pub fn mark_classified(&mut self, outcome: Outcome) {
        self.phase = SessionPhase::Classified;
        self.last_outcome = Some(outcome);
    }

    pub fn return_to_idle(&mut self) {
        self.phase = SessionPhase::Idle;
        self.first_code = None;
    }
}
