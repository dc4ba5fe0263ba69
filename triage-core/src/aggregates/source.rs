//! Sources of aggregate snapshots.
//!
//! [`AggregatesSource`] stands for the aggregates-fetch endpoint. Without a
//! live backend, [`PerturbationSource`] produces snapshots by nudging every
//! count of a baseline snapshot by a bounded random delta. The deltas come from
//! an injected [`DeltaSource`] so a fixed seed (or a scripted sequence) gives
//! exact, reproducible output.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::debug;

use super::{AggregateSnapshot, CategoryCount, ConfidenceBucket, TimelinePoint};
use crate::error::FetchError;

/// Produces complete aggregate snapshots.
#[async_trait]
pub trait AggregatesSource: Send + Sync {
    async fn fetch(&self) -> Result<AggregateSnapshot, FetchError>;
}

/// Supplies signed deltas in `[-bound, bound]`.
pub trait DeltaSource: Send {
    fn delta(&mut self, bound: u64) -> i64;
}

/// Uniform deltas drawn from any `rand` generator.
pub struct RandomDeltas<R>(pub R);

impl<R: Rng + Send> DeltaSource for RandomDeltas<R> {
    fn delta(&mut self, bound: u64) -> i64 {
        let bound = bound as i64;
        self.0.gen_range(-bound..=bound)
    }
}

/// Replays a fixed sequence of deltas, then yields zero.
///
/// Values outside `[-bound, bound]` are clamped to the bound.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDeltas {
    deltas: VecDeque<i64>,
}

impl ScriptedDeltas {
    pub fn new(deltas: impl IntoIterator<Item = i64>) -> Self {
        Self {
            deltas: deltas.into_iter().collect(),
        }
    }
}

impl DeltaSource for ScriptedDeltas {
    fn delta(&mut self, bound: u64) -> i64 {
        let bound = bound as i64;
        self.deltas
            .pop_front()
            .map(|d| d.clamp(-bound, bound))
            .unwrap_or(0)
    }
}

/// Delta source that always draws `-bound`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysMinimum;

impl DeltaSource for AlwaysMinimum {
    fn delta(&mut self, bound: u64) -> i64 {
        -(bound as i64)
    }
}

/// Maximum absolute delta per series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerturbationBounds {
    pub by_category: u64,
    pub timeline: u64,
    pub confidence_histogram: u64,
}

impl Default for PerturbationBounds {
    fn default() -> Self {
        Self {
            by_category: 10,
            timeline: 5,
            confidence_histogram: 15,
        }
    }
}

/// Perturb every count of `base` independently, clamping at zero.
///
/// Deltas are drawn in series order: categories, then timeline, then histogram.
pub fn perturb(
    base: &AggregateSnapshot,
    deltas: &mut dyn DeltaSource,
    bounds: PerturbationBounds,
) -> AggregateSnapshot {
    let by_category = base
        .by_category
        .iter()
        .map(|c| CategoryCount {
            category: c.category.clone(),
            count: nudge(c.count, deltas.delta(bounds.by_category)),
        })
        .collect();

    let timeline = base
        .timeline
        .iter()
        .map(|p| TimelinePoint {
            date: p.date.clone(),
            count: nudge(p.count, deltas.delta(bounds.timeline)),
        })
        .collect();

    let confidence_histogram = base
        .confidence_histogram
        .iter()
        .map(|b| ConfidenceBucket {
            range: b.range.clone(),
            count: nudge(b.count, deltas.delta(bounds.confidence_histogram)),
        })
        .collect();

    AggregateSnapshot {
        by_category,
        timeline,
        confidence_histogram,
    }
}

fn nudge(count: u64, delta: i64) -> u64 {
    count.saturating_add_signed(delta)
}

/// Local stand-in for the aggregates-fetch endpoint.
///
/// Every fetch perturbs the same baseline, so results never drift further than
/// the bounds from it.
pub struct PerturbationSource<D> {
    baseline: AggregateSnapshot,
    deltas: Mutex<D>,
    bounds: PerturbationBounds,
    latency: Duration,
}

impl<D: DeltaSource> PerturbationSource<D> {
    pub fn new(baseline: AggregateSnapshot, deltas: D) -> Self {
        Self {
            baseline,
            deltas: Mutex::new(deltas),
            bounds: PerturbationBounds::default(),
            latency: Duration::ZERO,
        }
    }

    pub fn with_bounds(mut self, bounds: PerturbationBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Simulated processing delay before each fetch resolves.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl<D: DeltaSource + 'static> AggregatesSource for PerturbationSource<D> {
    async fn fetch(&self) -> Result<AggregateSnapshot, FetchError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut deltas = self.deltas.lock().await;
        let snapshot = perturb(&self.baseline, &mut *deltas, self.bounds);
        debug!(
            "Perturbed snapshot: {} total annotations",
            snapshot.total_annotations()
        );
        Ok(snapshot)
    }
}
