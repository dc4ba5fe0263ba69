//! Aggregate metrics shown on the summary view.
//!
//! This module provides:
//! - The [`AggregateSnapshot`] and its three series
//! - The [`AggregatesSource`] abstraction over the aggregates-fetch endpoint
//! - A local perturbation source standing in for that endpoint
//! - The [`AggregationEngine`] that owns the current snapshot

mod engine;
mod source;

pub use engine::{AggregationEngine, RefreshApplied, SessionId};
pub use source::{
    perturb, AggregatesSource, AlwaysMinimum, DeltaSource, PerturbationBounds,
    PerturbationSource, RandomDeltas, ScriptedDeltas,
};

use serde::{Deserialize, Serialize};

/// Number of annotations assigned to one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

/// Number of annotations recorded on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub date: String,
    pub count: u64,
}

/// Number of documents whose confidence falls in one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceBucket {
    pub range: String,
    pub count: u64,
}

/// The full set of summary series. Always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub by_category: Vec<CategoryCount>,
    pub timeline: Vec<TimelinePoint>,
    pub confidence_histogram: Vec<ConfidenceBucket>,
}

impl AggregateSnapshot {
    /// The snapshot shown before any refresh has completed.
    pub fn baseline() -> Self {
        fn categories(entries: &[(&str, u64)]) -> Vec<CategoryCount> {
            entries
                .iter()
                .map(|(category, count)| CategoryCount {
                    category: category.to_string(),
                    count: *count,
                })
                .collect()
        }

        Self {
            by_category: categories(&[
                ("Technology", 450),
                ("Finance", 320),
                ("Sport", 280),
                ("Politics", 197),
            ]),
            timeline: [
                ("15/11", 45),
                ("16/11", 52),
                ("17/11", 48),
                ("18/11", 61),
                ("19/11", 55),
                ("20/11", 58),
                ("21/11", 63),
            ]
            .iter()
            .map(|(date, count)| TimelinePoint {
                date: date.to_string(),
                count: *count,
            })
            .collect(),
            confidence_histogram: [
                ("80-100%", 600),
                ("60-80%", 467),
                ("40-60%", 123),
                ("20-40%", 45),
                ("0-20%", 12),
            ]
            .iter()
            .map(|(range, count)| ConfidenceBucket {
                range: range.to_string(),
                count: *count,
            })
            .collect(),
        }
    }

    /// Total annotations across all categories.
    pub fn total_annotations(&self) -> u64 {
        self.by_category.iter().map(|c| c.count).sum()
    }

    /// True when both snapshots have the same categories and histogram
    /// buckets, in the same order.
    ///
    /// The timeline is not compared: its dates move with the reporting window.
    pub fn has_same_shape(&self, other: &AggregateSnapshot) -> bool {
        self.by_category
            .iter()
            .map(|c| &c.category)
            .eq(other.by_category.iter().map(|c| &c.category))
            && self
                .confidence_histogram
                .iter()
                .map(|b| &b.range)
                .eq(other.confidence_histogram.iter().map(|b| &b.range))
    }

    /// Share of each histogram bucket in whole percent, for pie labels.
    pub fn histogram_shares(&self) -> Vec<(String, u64)> {
        let total: u64 = self.confidence_histogram.iter().map(|b| b.count).sum();
        self.confidence_histogram
            .iter()
            .map(|b| {
                let share = if total == 0 {
                    0
                } else {
                    ((b.count as f64 / total as f64) * 100.0).round() as u64
                };
                (b.range.clone(), share)
            })
            .collect()
    }
}
