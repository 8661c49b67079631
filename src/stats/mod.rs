//! Running totals over the inspection log.
//!
//! The counters are a cache of what the store holds. They move forward by one
//! on every successful append and are rebuilt from a full snapshot on restore.

use serde::{Deserialize, Serialize};

use crate::{db::InspectionRecord, inspection::Outcome};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateCounters {
    pub total_inspections: u64,
    pub total_match: u64,
    pub total_mismatch: u64,
}

impl AggregateCounters {
    pub fn from_records(records: &[InspectionRecord]) -> Self {
        records
            .iter()
            .fold(Self::default(), |counters, record| counters.with(record.outcome))
    }

    /// Counters after one more inspection with `outcome`.
    pub fn with(self, outcome: Outcome) -> Self {
        let (total_match, total_mismatch) = match outcome {
            Outcome::Match => (self.total_match + 1, self.total_mismatch),
            Outcome::Mismatch => (self.total_match, self.total_mismatch + 1),
        };
        Self {
            total_inspections: self.total_inspections + 1,
            total_match,
            total_mismatch,
        }
    }
}

#[derive(Debug, Default)]
pub struct StatisticsAggregator {
    counters: AggregateCounters,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> AggregateCounters {
        self.counters
    }

    /// Call exactly once per successful append.
    pub fn on_append(&mut self, outcome: Outcome) -> AggregateCounters {
        self.counters = self.counters.with(outcome);
        self.counters
    }

    /// Replaces the counters with totals computed from a full store snapshot.
    ///
    /// Overwriting rather than adding keeps repeated restores from
    /// double-counting.
    pub fn recompute_from(&mut self, records: &[InspectionRecord]) -> AggregateCounters {
        self.counters = AggregateCounters::from_records(records);
        self.counters
    }

    pub fn reset(&mut self) -> AggregateCounters {
        self.counters = AggregateCounters::default();
        self.counters
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn record(id: i64, outcome: Outcome) -> InspectionRecord {
        InspectionRecord {
            id,
            timestamp: Utc::now(),
            code_a: "A".into(),
            code_b: if outcome == Outcome::Match { "A" } else { "B" }.into(),
            outcome,
        }
    }

    #[test]
    fn append_moves_total_and_matching_counter() {
        let mut aggregator = StatisticsAggregator::new();
        aggregator.on_append(Outcome::Match);
        let counters = aggregator.on_append(Outcome::Mismatch);

        assert_eq!(
            counters,
            AggregateCounters {
                total_inspections: 2,
                total_match: 1,
                total_mismatch: 1,
            }
        );
    }

    #[test]
    fn total_is_always_the_sum_of_outcomes() {
        let mut aggregator = StatisticsAggregator::new();
        for n in 0..25 {
            let outcome = if n % 3 == 0 { Outcome::Match } else { Outcome::Mismatch };
            let c = aggregator.on_append(outcome);
            assert_eq!(c.total_inspections, c.total_match + c.total_mismatch);
        }
        assert_eq!(aggregator.counters().total_match, 9);
        assert_eq!(aggregator.counters().total_mismatch, 16);
    }

    #[test]
    fn recompute_agrees_with_incremental_counting() {
        let outcomes = [
            Outcome::Match,
            Outcome::Mismatch,
            Outcome::Mismatch,
            Outcome::Match,
            Outcome::Match,
        ];
        let records: Vec<_> = outcomes
            .iter()
            .enumerate()
            .map(|(i, o)| record(i as i64 + 1, *o))
            .collect();

        let mut incremental = StatisticsAggregator::new();
        for outcome in outcomes {
            incremental.on_append(outcome);
        }

        let mut recounted = StatisticsAggregator::new();
        recounted.recompute_from(&records);

        assert_eq!(incremental.counters(), recounted.counters());
    }

    #[test]
    fn recompute_overwrites_instead_of_adding() {
        let records = vec![record(1, Outcome::Match), record(2, Outcome::Mismatch)];
        let mut aggregator = StatisticsAggregator::new();
        aggregator.on_append(Outcome::Match);
        aggregator.on_append(Outcome::Match);

        let first = aggregator.recompute_from(&records);
        let second = aggregator.recompute_from(&records);

        assert_eq!(first, second);
        assert_eq!(second.total_inspections, 2);
        assert_eq!(second.total_match, 1);
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut aggregator = StatisticsAggregator::new();
        aggregator.on_append(Outcome::Mismatch);
        assert_eq!(aggregator.reset(), AggregateCounters::default());
    }
}
