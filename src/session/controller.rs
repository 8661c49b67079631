use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    db::{InspectionRecord, LogStore, NewInspection, StoreError},
    inspection::{classify, normalize, Outcome},
    log_info, log_warn,
    stats::{AggregateCounters, StatisticsAggregator},
};

use super::{EventSink, SessionEvent, SessionPhase, SessionState};

const ENABLE_LOGS: bool = true;

/// What one inspection cycle produced.
#[derive(Debug)]
pub enum CycleReport {
    /// A reading was blank. Nothing was compared, stored or counted.
    Incomplete,
    Recorded {
        record: InspectionRecord,
        counters: AggregateCounters,
    },
    /// The pair was classified but the record could not be written.
    Unpersisted {
        outcome: Outcome,
        error: StoreError,
    },
}

impl CycleReport {
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            CycleReport::Incomplete => None,
            CycleReport::Recorded { record, .. } => Some(record.outcome),
            CycleReport::Unpersisted { outcome, .. } => Some(*outcome),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub records: Vec<InspectionRecord>,
    pub counters: AggregateCounters,
}

struct SessionInner {
    state: SessionState,
    stats: StatisticsAggregator,
}

/// Drives the scan, classify, persist and count sequence.
///
/// Every public operation holds the session lock for its whole duration,
/// including the store call, so cycles, restores and resets never interleave.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Mutex<SessionInner>>,
    store: LogStore,
    events: Arc<dyn EventSink>,
}

impl SessionController {
    pub fn new(store: LogStore, events: Arc<dyn EventSink>) -> Self {
        if !store.is_available() {
            log_warn!("Session started without persistence; inspections will not be recorded");
        }

        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                state: SessionState::new(),
                stats: StatisticsAggregator::new(),
            })),
            store,
            events,
        }
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state.clone()
    }

    pub async fn counters(&self) -> AggregateCounters {
        self.inner.lock().await.stats.counters()
    }

    pub async fn submit_first(&self, raw: &str) -> SessionPhase {
        let mut inner = self.inner.lock().await;
        inner.state.accept_first(raw);
        inner.state.phase
    }

    /// Completes the pair started by [`submit_first`](Self::submit_first).
    /// Without a pending first reading the cycle is incomplete.
    pub async fn submit_second(&self, raw: &str) -> CycleReport {
        let mut inner = self.inner.lock().await;
        let first = inner.state.take_first();
        self.run_cycle(&mut inner, first.as_deref(), raw).await
    }

    /// Submits both readings as one cycle.
    pub async fn inspect(&self, code_a: &str, code_b: &str) -> CycleReport {
        let mut inner = self.inner.lock().await;
        inner.state.accept_first(code_a);
        let first = inner.state.take_first();
        self.run_cycle(&mut inner, first.as_deref(), code_b).await
    }

    async fn run_cycle(
        &self,
        inner: &mut SessionInner,
        first: Option<&str>,
        second: &str,
    ) -> CycleReport {
        let pair = first
            .and_then(normalize)
            .zip(normalize(second));
        let Some((code_a, code_b)) = pair else {
            inner.state.return_to_idle();
            self.events.emit(SessionEvent::IncompleteReading);
            return CycleReport::Incomplete;
        };

        let outcome = classify(code_a, code_b);
        inner.state.mark_classified(outcome);

        let inspection = NewInspection::captured_now(code_a, code_b, outcome);
        let report = match self.store.append(inspection).await {
            Ok(record) => {
                let counters = inner.stats.on_append(outcome);
                self.events.emit(SessionEvent::Classified { outcome });
                self.events.emit(SessionEvent::RecordAppended {
                    record: record.clone(),
                });
                self.events.emit(SessionEvent::CountersChanged { counters });
                CycleReport::Recorded { record, counters }
            }
            Err(error) => {
                log_warn!("Inspection classified as {} but not recorded: {error}", outcome.as_str());
                self.events.emit(SessionEvent::Classified { outcome });
                self.emit_failure(&error);
                CycleReport::Unpersisted { outcome, error }
            }
        };

        inner.state.return_to_idle();
        report
    }

    /// Reloads every stored record and rebuilds the counters from them.
    pub async fn restore(&self) -> Result<RestoreReport, StoreError> {
        let mut inner = self.inner.lock().await;
        let records = match self.store.list_all().await {
            Ok(records) => records,
            Err(error) => {
                self.emit_failure(&error);
                return Err(error);
            }
        };

        let counters = inner.stats.recompute_from(&records);
        log_info!("Restored {} inspections", records.len());

        self.events.emit(SessionEvent::RecordsRestored {
            records: records.clone(),
        });
        self.events.emit(SessionEvent::CountersChanged { counters });

        Ok(RestoreReport { records, counters })
    }

    /// Rebuilds the counters from the store without handing the records to
    /// the presentation layer. Used when a process starts so the totals
    /// cover history from earlier runs.
    pub async fn recount(&self) -> Result<AggregateCounters, StoreError> {
        let mut inner = self.inner.lock().await;
        match self.store.list_all().await {
            Ok(records) => Ok(inner.stats.recompute_from(&records)),
            Err(error) => {
                self.emit_failure(&error);
                Err(error)
            }
        }
    }

    pub async fn export_snapshot(&self) -> Result<Vec<InspectionRecord>, StoreError> {
        let _inner = self.inner.lock().await;
        self.store.list_all().await.map_err(|error| {
            self.emit_failure(&error);
            error
        })
    }

    pub async fn records_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<InspectionRecord>, StoreError> {
        let _inner = self.inner.lock().await;
        self.store.list_between(from, to).await.map_err(|error| {
            self.emit_failure(&error);
            error
        })
    }

    /// Erases the whole log and zeroes the counters. Not recoverable.
    ///
    /// The counters and any pending first reading are cleared even when the
    /// store refuses the clear; the failure is still reported and returned.
    pub async fn reset(&self) -> Result<AggregateCounters, StoreError> {
        let mut inner = self.inner.lock().await;
        let cleared = self.store.clear_all().await;

        inner.state = SessionState::new();
        let counters = inner.stats.reset();

        match cleared {
            Ok(removed) => {
                self.events.emit(SessionEvent::LogCleared { removed });
                self.events.emit(SessionEvent::CountersChanged { counters });
                Ok(counters)
            }
            Err(error) => {
                log_warn!("Counters zeroed but the inspection log was not cleared: {error}");
                self.emit_failure(&error);
                self.events.emit(SessionEvent::CountersChanged { counters });
                Err(error)
            }
        }
    }

    /// Number of records currently stored.
    pub async fn record_count(&self) -> Result<u64, StoreError> {
        let _inner = self.inner.lock().await;
        self.store.count().await.map_err(|error| {
            self.emit_failure(&error);
            error
        })
    }

    fn emit_failure(&self, error: &StoreError) {
        self.events.emit(SessionEvent::StoreFailure {
            message: error.to_string(),
            degraded: error.is_unavailable(),
        });
    }
}
