//! Fan-in merge of worker partial results.

use std::collections::BTreeMap;

use crossbeam_channel::Receiver;
use tracing::debug;

use crate::stats::{FinalResult, PartialResult};

/// Accumulates partial results; averages only exist after [`Aggregator::finish`].
#[derive(Debug, Default)]
pub struct Aggregator {
    count: BTreeMap<String, u64>,
    sum: BTreeMap<String, u64>,
    partials: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one worker's counts and sums into the running totals.
    pub fn fold(&mut self, partial: PartialResult) {
        for (category, count) in partial.count {
            *self.count.entry(category).or_default() += count;
        }
        for (category, sum) in partial.sum {
            let total = self.sum.entry(category).or_default();
            *total = total.saturating_add(sum);
        }
        self.partials += 1;
    }

    /// Number of partial results folded so far.
    pub fn partials(&self) -> usize {
        self.partials
    }

    /// Computes `avg = sum / count` for every category seen.
    ///
    /// Every key in `count` was created by at least one record, so the
    /// divisor is never zero.
    pub fn finish(self) -> FinalResult {
        let avg = self
            .count
            .iter()
            .map(|(category, &count)| {
                let sum = self.sum.get(category).copied().unwrap_or_default();
                (category.clone(), sum as f64 / count as f64)
            })
            .collect();

        FinalResult {
            count: self.count,
            sum: self.sum,
            avg,
        }
    }
}

/// Merges any collection of partial results into a [`FinalResult`].
pub fn merge_partials<I>(partials: I) -> FinalResult
where
    I: IntoIterator<Item = PartialResult>,
{
    let mut aggregator = Aggregator::new();
    for partial in partials {
        aggregator.fold(partial);
    }
    aggregator.finish()
}

/// Drains `results` until every sender has been dropped, then finalizes.
pub fn merge_results(results: Receiver<PartialResult>) -> FinalResult {
    let mut aggregator = Aggregator::new();

    for partial in results.iter() {
        debug!(
            categories = partial.count.len(),
            received = aggregator.partials() + 1,
            "Merging partial result"
        );
        aggregator.fold(partial);
    }

    debug!(
        partials = aggregator.partials(),
        "Results channel closed, computing averages"
    );
    aggregator.finish()
}
