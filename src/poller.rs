//! Blocking "poll until target state" primitive.
//!
//! A refresh function reports either `None` (the resource is absent) or a
//! value together with its state label. [`StateChangeConf::wait_for_state`]
//! keeps calling it until the label lands in the target set, leaves the
//! pending set, or the deadline passes. An empty target set means absence is
//! the goal, which is how deletions are awaited.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::trace;

/// Why a wait did not reach its target.
#[derive(Debug, Error)]
pub enum WaitError<L, E>
where
    L: fmt::Debug,
    E: std::error::Error + 'static,
{
    #[error("timeout while waiting for state to become {target:?} (last state: {last_state:?}, timeout: {timeout:?})")]
    Timeout {
        last_state: Option<L>,
        target: Vec<L>,
        timeout: Duration,
    },

    #[error("unexpected state {state:?}, wanted target {target:?}")]
    UnexpectedState { state: L, target: Vec<L> },

    #[error("couldn't find resource ({checks} retries)")]
    NotFound { checks: u32 },

    #[error(transparent)]
    Refresh(E),
}

/// Pending/target vocabulary plus timing for one wait.
#[derive(Debug, Clone)]
pub struct StateChangeConf<L> {
    pub pending: Vec<L>,
    pub target: Vec<L>,
    pub timeout: Duration,
    /// Sleep before the first refresh.
    pub delay: Duration,
    /// First inter-poll delay; doubles after every poll up to `max_poll_interval`.
    pub min_poll_interval: Duration,
    pub max_poll_interval: Duration,
    /// Consecutive absent observations tolerated while the target set is non-empty.
    pub not_found_checks: u32,
}

impl<L> StateChangeConf<L>
where
    L: PartialEq + Clone + fmt::Debug,
{
    pub fn new(pending: Vec<L>, target: Vec<L>, timeout: Duration) -> Self {
        Self {
            pending,
            target,
            timeout,
            delay: Duration::ZERO,
            min_poll_interval: Duration::from_millis(100),
            max_poll_interval: Duration::from_secs(10),
            not_found_checks: 20,
        }
    }

    /// Block until the refreshed state reaches the target set.
    ///
    /// Returns the last refreshed value, or `None` when absence was the target.
    /// Refresh errors are returned immediately without retry.
    pub fn wait_for_state<T, E, F>(&self, mut refresh: F) -> Result<Option<T>, WaitError<L, E>>
    where
        E: std::error::Error + 'static,
        F: FnMut() -> Result<Option<(T, L)>, E>,
    {
        // A timeout too large to represent as an instant means no deadline.
        let deadline = Instant::now().checked_add(self.timeout);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        let mut interval = self.min_poll_interval;
        let mut not_found = 0u32;
        let mut last_state: Option<L> = None;

        loop {
            match refresh().map_err(WaitError::Refresh)? {
                None => {
                    if self.target.is_empty() {
                        return Ok(None);
                    }
                    not_found += 1;
                    if not_found > self.not_found_checks {
                        return Err(WaitError::NotFound {
                            checks: self.not_found_checks,
                        });
                    }
                }
                Some((value, state)) => {
                    not_found = 0;
                    if self.target.contains(&state) {
                        return Ok(Some(value));
                    }
                    if !self.pending.contains(&state) {
                        return Err(WaitError::UnexpectedState {
                            state,
                            target: self.target.clone(),
                        });
                    }
                    trace!(state = ?state, "still pending");
                    last_state = Some(state);
                }
            }

            let mut pause = interval;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return Err(WaitError::Timeout {
                        last_state,
                        target: self.target.clone(),
                        timeout: self.timeout,
                    });
                }
                pause = pause.min(deadline - now);
            }

            thread::sleep(pause);
            interval = interval.saturating_mul(2).min(self.max_poll_interval);
        }
    }
}
