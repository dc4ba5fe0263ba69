//! At-most-one-in-flight coordination of snapshot refreshes.
//!
//! The coordinator is a two-state machine: `Idle -> Refreshing -> Idle`.
//! A request made while a refresh is in flight is refused, not queued. Each
//! refresh is spawned as its own task and always runs to completion, even if
//! the caller drops its [`RefreshHandle`]; the [`RefreshToken`] it carries ties
//! the result to the session it was issued in, so a late result cannot land in
//! a newer session.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::aggregates::{AggregateSnapshot, AggregationEngine, RefreshApplied, SessionId};
use crate::error::RefreshError;

/// Whether a refresh is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// Identifies one issued refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshToken {
    pub session: SessionId,
    pub sequence: u64,
}

/// Result of a completed refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The new snapshot is now current.
    Applied {
        token: RefreshToken,
        snapshot: Arc<AggregateSnapshot>,
    },
    /// The refresh finished after its session ended; nothing was changed.
    Discarded {
        token: RefreshToken,
        current_session: SessionId,
    },
    /// The refresh failed; the previous snapshot is still current.
    Failed {
        token: RefreshToken,
        error: RefreshError,
    },
}

impl RefreshOutcome {
    pub fn token(&self) -> RefreshToken {
        match self {
            Self::Applied { token, .. }
            | Self::Discarded { token, .. }
            | Self::Failed { token, .. } => *token,
        }
    }
}

/// Answer to [`RefreshCoordinator::request_refresh`].
#[derive(Debug)]
pub enum RefreshRequest {
    Started(RefreshHandle),
    /// Another refresh is in flight; nothing was started.
    AlreadyInProgress,
}

impl RefreshRequest {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }
}

/// Handle on a spawned refresh.
///
/// Dropping the handle does not cancel the refresh.
#[derive(Debug)]
pub struct RefreshHandle {
    token: RefreshToken,
    task: JoinHandle<RefreshOutcome>,
}

impl RefreshHandle {
    pub fn token(&self) -> RefreshToken {
        self.token
    }

    /// Wait for the refresh to finish.
    pub async fn wait(self) -> RefreshOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => RefreshOutcome::Failed {
                token: self.token,
                error: RefreshError::Aborted {
                    reason: e.to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Default)]
struct CoordinatorState {
    in_flight: Option<RefreshToken>,
    next_sequence: u64,
}

/// Serialises refreshes of an [`AggregationEngine`].
#[derive(Clone)]
pub struct RefreshCoordinator {
    engine: Arc<AggregationEngine>,
    state: Arc<Mutex<CoordinatorState>>,
}

impl RefreshCoordinator {
    pub fn new(engine: Arc<AggregationEngine>) -> Self {
        Self {
            engine,
            state: Arc::new(Mutex::new(CoordinatorState::default())),
        }
    }

    pub fn engine(&self) -> &Arc<AggregationEngine> {
        &self.engine
    }

    fn lock_state(&self) -> MutexGuard<'_, CoordinatorState> {
        // Poisoning is ignored: no holder leaves the fields half-updated.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> RefreshState {
        if self.lock_state().in_flight.is_some() {
            RefreshState::Refreshing
        } else {
            RefreshState::Idle
        }
    }

    /// The refresh trigger is disabled while a refresh is in flight.
    pub fn trigger_enabled(&self) -> bool {
        self.state() == RefreshState::Idle
    }

    /// Start a refresh unless one is already in flight.
    ///
    /// Must be called from within a tokio runtime.
    pub fn request_refresh(&self) -> RefreshRequest {
        let token = {
            let mut state = self.lock_state();
            if let Some(in_flight) = state.in_flight {
                info!(
                    "Refresh {} already in progress, ignoring request",
                    in_flight.sequence
                );
                return RefreshRequest::AlreadyInProgress;
            }
            state.next_sequence += 1;
            let token = RefreshToken {
                session: self.engine.session(),
                sequence: state.next_sequence,
            };
            state.in_flight = Some(token);
            token
        };

        info!("Starting refresh {} in {}", token.sequence, token.session);

        let engine = self.engine.clone();
        let guard = InFlightGuard {
            state: self.state.clone(),
            token,
        };
        let task = tokio::spawn(async move {
            let outcome = run_refresh(&engine, token).await;
            drop(guard);
            outcome
        });

        RefreshRequest::Started(RefreshHandle { token, task })
    }
}

/// Returns the coordinator to `Idle` when the refresh task ends, however it ends.
struct InFlightGuard {
    state: Arc<Mutex<CoordinatorState>>,
    token: RefreshToken,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.in_flight == Some(self.token) {
            state.in_flight = None;
        }
    }
}

async fn run_refresh(engine: &AggregationEngine, token: RefreshToken) -> RefreshOutcome {
    match engine.refresh_in(token.session).await {
        Ok(RefreshApplied::Applied(snapshot)) => {
            info!("Refresh {} applied", token.sequence);
            RefreshOutcome::Applied { token, snapshot }
        }
        Ok(RefreshApplied::Stale { current, .. }) => {
            warn!(
                "Refresh {} finished after {} ended, result discarded",
                token.sequence, token.session
            );
            RefreshOutcome::Discarded {
                token,
                current_session: current,
            }
        }
        Err(e) => {
            error!("Refresh {} failed: {}", token.sequence, e);
            RefreshOutcome::Failed {
                token,
                error: e.into(),
            }
        }
    }
}

/// Request a refresh every `period`, skipping ticks that find one in flight.
///
/// The first refresh happens one full period after start. Runs until the task
/// is aborted.
pub async fn auto_refresh_loop(coordinator: RefreshCoordinator, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        ticker.tick().await;

        match coordinator.request_refresh() {
            RefreshRequest::Started(handle) => {
                info!("Periodic refresh {} started", handle.token().sequence);
            }
            RefreshRequest::AlreadyInProgress => {
                info!("Skipping periodic refresh, previous refresh still running");
            }
        }
    }
}
