//! Notifications pushed from the session controller to whatever renders them.

use serde::Serialize;

use crate::{db::InspectionRecord, inspection::Outcome, stats::AggregateCounters};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SessionEvent {
    /// One or both readings were blank; nothing was compared or stored.
    IncompleteReading,
    Classified {
        outcome: Outcome,
    },
    RecordAppended {
        record: InspectionRecord,
    },
    CountersChanged {
        counters: AggregateCounters,
    },
    RecordsRestored {
        records: Vec<InspectionRecord>,
    },
    RecordsListed {
        records: Vec<InspectionRecord>,
    },
    LogCleared {
        removed: u64,
    },
    /// A store call failed. `degraded` is set when the store never opened.
    StoreFailure {
        message: String,
        degraded: bool,
    },
    Notice {
        message: String,
    },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::IncompleteReading => "incomplete-reading",
            SessionEvent::Classified { .. } => "inspection-classified",
            SessionEvent::RecordAppended { .. } => "record-appended",
            SessionEvent::CountersChanged { .. } => "counters-changed",
            SessionEvent::RecordsRestored { .. } => "records-restored",
            SessionEvent::RecordsListed { .. } => "records-listed",
            SessionEvent::LogCleared { .. } => "log-cleared",
            SessionEvent::StoreFailure { .. } => "store-failure",
            SessionEvent::Notice { .. } => "notice",
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: SessionEvent);
}
