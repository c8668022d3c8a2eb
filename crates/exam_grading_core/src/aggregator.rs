//! crates/exam_grading_core/src/aggregator.rs
//!
//! Folds per-answer correctness and timing into per-domain statistics.

use crate::domain::DomainStat;
use std::collections::BTreeMap;

/// Accumulates statistics for a single grading run.
///
/// Domains are discovered from the input. The map is keyed by domain name so
/// that iteration, and therefore best/worst tie-breaking, is deterministic.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DomainAggregator {
    stats: BTreeMap<String, DomainStat>,
    correct_count: u32,
    total_questions: u32,
    total_time_ms: u64,
}

impl DomainAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one graded answer. Time sums saturate at `u64::MAX`.
    pub fn record(&mut self, domain: &str, is_correct: bool, time_taken_ms: Option<u64>) {
        let time_ms = time_taken_ms.unwrap_or(0);

        self.total_questions += 1;
        self.total_time_ms = self.total_time_ms.saturating_add(time_ms);
        if is_correct {
            self.correct_count += 1;
        }

        let stat = self.stats.entry(domain.to_string()).or_default();
        stat.total += 1;
        stat.time_sum_ms = stat.time_sum_ms.saturating_add(time_ms);
        if is_correct {
            stat.correct += 1;
        }
    }

    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn total_time_ms(&self) -> u64 {
        self.total_time_ms
    }

    pub fn stats(&self) -> &BTreeMap<String, DomainStat> {
        &self.stats
    }

    pub fn into_stats(self) -> BTreeMap<String, DomainStat> {
        self.stats
    }
}

/// Builds the per-domain map from `(domain, is_correct, time_taken_ms)` tuples.
pub fn aggregate<'a, I>(answers: I) -> BTreeMap<String, DomainStat>
where
    I: IntoIterator<Item = (&'a str, bool, Option<u64>)>,
{
    let mut aggregator = DomainAggregator::new();
    for (domain, is_correct, time_taken_ms) in answers {
        aggregator.record(domain, is_correct, time_taken_ms);
    }
    aggregator.into_stats()
}
