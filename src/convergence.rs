//! Polling until the server leaves its lock or reaches a target state.
//!
//! Both waits re-poll `server/status` at a fixed interval. The lock wait has
//! no deadline unless [`PollPolicy::max_polls`] is set; the state wait is
//! bounded by the caller's timeout. Any failed poll aborts the wait.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::config::TargetState;
use crate::error::{ReconcileError, Result};
use crate::glesys::{PowerState, ServerApi};

/// Suspends the current task between polls.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Sleeps for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Timing of the convergence waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between two status polls.
    pub interval: Duration,
    /// Pause after a fresh server first reports `running`.
    pub settle: Duration,
    /// Upper bound on polls per wait. `None` leaves the lock wait unbounded.
    pub max_polls: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            settle: Duration::from_secs(1),
            max_polls: None,
        }
    }
}

impl PollPolicy {
    /// A policy that never pauses.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            interval: Duration::ZERO,
            settle: Duration::ZERO,
            max_polls: None,
        }
    }

    /// Bounds every wait to `max_polls` polls.
    #[must_use]
    pub const fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }
}

/// Polls a server's power state.
pub struct StateWaiter<'a, A: ServerApi + ?Sized> {
    api: &'a A,
    sleeper: &'a dyn Sleeper,
    policy: PollPolicy,
}

impl<'a, A: ServerApi + ?Sized> StateWaiter<'a, A> {
    /// Creates a waiter over `api`.
    #[must_use]
    pub fn new(api: &'a A, sleeper: &'a dyn Sleeper, policy: PollPolicy) -> Self {
        Self {
            api,
            sleeper,
            policy,
        }
    }

    /// Polls until the server is no longer locked and returns the first
    /// non-locked state.
    ///
    /// # Errors
    ///
    /// Returns the first poll error, or `LockWaitExhausted` once
    /// `max_polls` is reached.
    pub async fn wait_for_unlock(&self, server_id: &str) -> Result<PowerState> {
        let mut polls = 0u32;

        loop {
            let state = self.api.status(server_id).await?;
            polls += 1;
            debug!("Server {server_id} is {state} (poll {polls})");

            if !state.is_busy() {
                return Ok(state);
            }

            if self.policy.max_polls.is_some_and(|max| polls >= max) {
                return Err(ReconcileError::LockWaitExhausted {
                    server_id: server_id.to_string(),
                    polls,
                }
                .into());
            }

            self.sleeper.sleep(self.policy.interval).await;
        }
    }

    /// Polls until the server reports the state `target` waits for.
    ///
    /// `rebooted` waits for `running`; `present` returns after the first
    /// poll whatever it reports.
    ///
    /// # Errors
    ///
    /// Returns the first poll error, or a timeout once `timeout` worth of
    /// intervals (or `max_polls`) have passed without a match.
    pub async fn wait_for_state(
        &self,
        server_id: &str,
        target: TargetState,
        timeout: Duration,
    ) -> Result<PowerState> {
        let awaited = target.awaited_state();
        let mut waited = Duration::ZERO;
        let mut polls = 0u32;

        loop {
            let state = self.api.status(server_id).await?;
            polls += 1;
            debug!("Server {server_id} is {state}, waiting for {target} (poll {polls})");

            if awaited.as_ref().is_none_or(|want| *want == state) {
                return Ok(state);
            }

            let exhausted = self.policy.max_polls.is_some_and(|max| polls >= max);
            if exhausted || waited >= timeout {
                return Err(ReconcileError::Timeout {
                    server_id: server_id.to_string(),
                    expected_state: awaited.map_or_else(|| target.to_string(), |s| s.to_string()),
                }
                .into());
            }

            self.sleeper.sleep(self.policy.interval).await;
            waited += self.policy.interval;
        }
    }

    /// Pauses for the settle delay.
    pub async fn settle(&self) {
        self.sleeper.sleep(self.policy.settle).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GlesysError;
    use crate::glesys::mock::MockApi;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    fn sequence(states: &[&str]) -> MockApi {
        let mut remaining: Vec<PowerState> =
            states.iter().rev().map(|s| PowerState::from(*s)).collect();
        let mut api = MockApi::new();
        api.expect_status()
            .times(states.len())
            .returning(move |_| Ok(remaining.pop().unwrap()));
        api
    }

    #[tokio::test]
    async fn test_lock_wait_polls_until_unlocked() {
        let api = sequence(&["locked", "locked", "running"]);
        let sleeper = RecordingSleeper::default();
        let waiter = StateWaiter::new(&api, &sleeper, PollPolicy::default());

        let state = waiter.wait_for_unlock("wps1").await.unwrap();
        assert_eq!(state, PowerState::Running);
        assert_eq!(
            *sleeper.slept.lock().unwrap(),
            vec![Duration::from_secs(1), Duration::from_secs(1)]
        );
    }

    #[tokio::test]
    async fn test_lock_wait_bound() {
        let api = sequence(&["locked", "locked"]);
        let sleeper = RecordingSleeper::default();
        let waiter = StateWaiter::new(&api, &sleeper, PollPolicy::immediate().with_max_polls(2));

        let err = waiter.wait_for_unlock("wps1").await.unwrap_err();
        assert!(matches!(
            err,
            GlesysError::Reconcile(ReconcileError::LockWaitExhausted { polls: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_present_exits_on_first_poll() {
        let api = sequence(&["stopped"]);
        let sleeper = RecordingSleeper::default();
        let waiter = StateWaiter::new(&api, &sleeper, PollPolicy::default());

        let state = waiter
            .wait_for_state("wps1", TargetState::Present, Duration::from_secs(600))
            .await
            .unwrap();
        assert_eq!(state, PowerState::Stopped);
        assert!(sleeper.slept.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rebooted_waits_for_running() {
        let api = sequence(&["locked", "stopped", "running"]);
        let sleeper = RecordingSleeper::default();
        let waiter = StateWaiter::new(&api, &sleeper, PollPolicy::default());

        let state = waiter
            .wait_for_state("wps1", TargetState::Rebooted, Duration::from_secs(600))
            .await
            .unwrap();
        assert_eq!(state, PowerState::Running);
    }

    #[tokio::test]
    async fn test_state_wait_times_out() {
        let api = sequence(&["stopped", "stopped", "stopped"]);
        let sleeper = RecordingSleeper::default();
        let waiter = StateWaiter::new(&api, &sleeper, PollPolicy::default());

        let err = waiter
            .wait_for_state("wps1", TargetState::Running, Duration::from_secs(2))
            .await
            .unwrap_err();
        match err {
            GlesysError::Reconcile(ReconcileError::Timeout { expected_state, .. }) => {
                assert_eq!(expected_state, "running");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_poll_error_aborts() {
        let mut api = MockApi::new();
        api.expect_status().times(1).returning(|_| {
            Err(crate::error::ApiError::provider(500, "internal error").into())
        });
        let sleeper = RecordingSleeper::default();
        let waiter = StateWaiter::new(&api, &sleeper, PollPolicy::default());

        assert!(waiter.wait_for_unlock("wps1").await.is_err());
    }
}
