//! Owner of the current aggregate snapshot.
//!
//! The snapshot is only ever replaced whole, under a write lock, so readers see
//! either the old series or the new series and never a mix. Every snapshot
//! belongs to a session; starting a new session resets to the baseline and
//! makes any refresh issued in an older session unable to apply its result.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use super::{AggregateSnapshot, AggregatesSource};
use crate::error::FetchError;

/// Identifies one viewing session of the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// What happened to a fetched snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshApplied {
    /// The snapshot replaced the current one.
    Applied(Arc<AggregateSnapshot>),
    /// The session changed while fetching; the result was dropped.
    Stale {
        requested: SessionId,
        current: SessionId,
    },
}

pub struct AggregationEngine {
    source: Arc<dyn AggregatesSource>,
    baseline: AggregateSnapshot,
    snapshot: RwLock<Arc<AggregateSnapshot>>,
    /// Only written while holding the `snapshot` write lock.
    session: AtomicU64,
}

impl AggregationEngine {
    pub fn new(baseline: AggregateSnapshot, source: Arc<dyn AggregatesSource>) -> Self {
        Self {
            source,
            snapshot: RwLock::new(Arc::new(baseline.clone())),
            baseline,
            session: AtomicU64::new(0),
        }
    }

    /// The current snapshot.
    pub async fn snapshot(&self) -> Arc<AggregateSnapshot> {
        self.snapshot.read().await.clone()
    }

    pub fn session(&self) -> SessionId {
        SessionId(self.session.load(Ordering::SeqCst))
    }

    /// Start a new session from the baseline snapshot.
    ///
    /// Refreshes still in flight for the previous session will complete but
    /// their results are discarded.
    pub async fn begin_session(&self) -> SessionId {
        let mut snapshot = self.snapshot.write().await;
        let session = SessionId(self.session.fetch_add(1, Ordering::SeqCst) + 1);
        *snapshot = Arc::new(self.baseline.clone());
        info!("Started {} from baseline snapshot", session);
        session
    }

    /// Fetch a new snapshot and install it in the current session.
    pub async fn refresh(&self) -> Result<RefreshApplied, FetchError> {
        self.refresh_in(self.session()).await
    }

    /// Fetch a new snapshot and install it only if `session` is still current.
    ///
    /// On fetch failure, or if the fetched snapshot does not have the same
    /// categories and buckets as the current one, the current snapshot is kept.
    pub async fn refresh_in(&self, session: SessionId) -> Result<RefreshApplied, FetchError> {
        let fetched = match self.source.fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Aggregates fetch failed, keeping current snapshot: {}", e);
                return Err(e);
            }
        };

        let mut current = self.snapshot.write().await;
        let current_session = self.session();
        if current_session != session {
            warn!(
                "Discarding refresh for {}: {} is now active",
                session, current_session
            );
            return Ok(RefreshApplied::Stale {
                requested: session,
                current: current_session,
            });
        }

        if !current.has_same_shape(&fetched) {
            warn!("Fetched snapshot does not match current categories or buckets");
            return Err(FetchError::Malformed {
                reason: "category or bucket labels changed".to_string(),
            });
        }

        let fetched = Arc::new(fetched);
        *current = fetched.clone();
        info!(
            "Applied refreshed snapshot in {}: {} total annotations",
            session,
            fetched.total_annotations()
        );
        Ok(RefreshApplied::Applied(fetched))
    }
}
