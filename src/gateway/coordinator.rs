//! Single-flight coordination of refresh exchanges.
//!
//! The coordinator owns the refresh-in-progress flag and the ordered queue of
//! waiters. `begin` either hands out the one `RefreshLease` allowed at a time
//! or enqueues a `Waiter`; both decisions happen under one lock with no await
//! in between, so two exchanges can never be started for the same expiry.
//!
//! The lease settles the episode exactly once. If it is dropped unsettled
//! (panic, cancelled future) its `Drop` impl fails every waiter and clears the
//! flag so nothing stays parked.

use crate::errors::AppError;
use secrecy::SecretString;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Outcome delivered to every waiter of one refresh episode.
pub type RefreshOutcome = Result<SecretString, AppError>;

const INTERRUPTED: &str = "Token refresh was interrupted before completing.";

#[derive(Default)]
struct RefreshState {
    in_progress: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Owner of the refresh flag and the pending-refresh queue.
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

/// Result of asking to refresh: run the exchange, or wait for the one running.
pub enum Ticket<'a> {
    Leader(RefreshLease<'a>),
    Waiter(Waiter),
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claims the refresh or joins the queue of the one in flight.
    pub fn begin(&self) -> Ticket<'_> {
        let mut state = self.lock();

        if state.in_progress {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            debug!(waiters = state.waiters.len(), "refresh in flight, request queued");
            Ticket::Waiter(Waiter { rx })
        } else {
            state.in_progress = true;
            debug!("refresh claimed");
            Ticket::Leader(RefreshLease {
                coordinator: self,
                settled: false,
            })
        }
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.lock().in_progress
    }

    #[must_use]
    pub fn pending_waiters(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Clears the flag and drains the queue in one critical section, then
    /// resumes the drained waiters in enqueue order.
    fn settle(&self, outcome: &RefreshOutcome) -> usize {
        let waiters = {
            let mut state = self.lock();
            state.in_progress = false;
            std::mem::take(&mut state.waiters)
        };

        let resumed = waiters.len();
        for waiter in waiters {
            // the receiving request may have been dropped; nothing to resume then
            let _ = waiter.send(outcome.clone());
        }

        resumed
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive right to run the refresh exchange of the current episode.
pub struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshLease<'_> {
    /// Resumes every waiter with `token`; returns how many were resumed.
    pub fn succeed(mut self, token: &SecretString) -> usize {
        self.settled = true;
        self.coordinator.settle(&Ok(token.clone()))
    }

    /// Resumes every waiter with `error`; returns how many were resumed.
    pub fn fail(mut self, error: &AppError) -> usize {
        self.settled = true;
        self.coordinator.settle(&Err(error.clone()))
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let resumed = self
                .coordinator
                .settle(&Err(AppError::Network(INTERRUPTED.to_string())));
            warn!(resumed, "refresh abandoned before settling");
        }
    }
}

/// A request parked until the in-flight refresh settles.
pub struct Waiter {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl Waiter {
    pub async fn wait(self) -> RefreshOutcome {
        self.rx
            .await
            .unwrap_or_else(|_| Err(AppError::Network(INTERRUPTED.to_string())))
    }
}
