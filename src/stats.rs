use std::collections::BTreeMap;

use serde::Serialize;

use crate::parser::MovementRecord;

/// Per-category count and sum built up by a single worker.
///
/// Maps are sparse: a category only appears once a record for it was seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialResult {
    pub count: BTreeMap<String, u64>,
    pub sum: BTreeMap<String, u64>,
}

impl PartialResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one record into the running totals.
    pub fn record(&mut self, movement: &MovementRecord) {
        *self.count.entry(movement.category.clone()).or_default() += 1;

        let sum = self.sum.entry(movement.category.clone()).or_default();
        *sum = sum.saturating_add(movement.amount);
    }

    pub fn is_empty(&self) -> bool {
        self.count.is_empty()
    }
}

/// Merged statistics across every worker, with averages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinalResult {
    pub count: BTreeMap<String, u64>,
    pub sum: BTreeMap<String, u64>,
    pub avg: BTreeMap<String, f64>,
}

/// Statistics for one category, as read back from a [`FinalResult`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategorySummary {
    pub count: u64,
    pub sum: u64,
    pub avg: f64,
}

impl FinalResult {
    /// Number of records folded into the result, across all categories.
    pub fn total_records(&self) -> u64 {
        self.count.values().sum()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.count.keys().map(String::as_str)
    }

    pub fn get(&self, category: &str) -> Option<CategorySummary> {
        Some(CategorySummary {
            count: *self.count.get(category)?,
            sum: *self.sum.get(category)?,
            avg: *self.avg.get(category)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.count.is_empty()
    }
}
