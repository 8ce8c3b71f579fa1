//! Reconciler for maintaining the desired server.
//!
//! This module implements one reconciliation pass: look the server up,
//! decide, mutate, wait for the provider to settle, and report the latest
//! snapshot. Every call is awaited in sequence; a failure aborts the pass.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{DesiredServer, TargetState};
use crate::convergence::{PollPolicy, Sleeper, StateWaiter, TokioSleeper};
use crate::error::{ReconcileError, Result};
use crate::glesys::{
    find_server, CreateServerRequest, PowerAction, ServerApi, ServerSnapshot,
};
use crate::planner::{decide, power_transition, ActionDecision};

/// Reconciler for a single server.
pub struct Reconciler<'a, A: ServerApi + ?Sized> {
    /// Provider API.
    api: &'a A,
    /// Pause between polls.
    sleeper: Box<dyn Sleeper + 'a>,
    /// Poll timing.
    policy: PollPolicy,
    /// Report what would change without mutating anything.
    dry_run: bool,
}

/// What a reconciliation would do, computed without mutating anything.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcilePlan {
    /// The server as currently observed, if it exists.
    pub snapshot: Option<ServerSnapshot>,
    /// The action decided for the configuration.
    pub decision: ActionDecision,
    /// Power action implied by the target state and the observed state.
    pub power: Option<PowerAction>,
}

impl ReconcilePlan {
    /// Returns true if applying the plan would mutate the server.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.decision.is_change() || self.power.is_some()
    }
}

/// The server as reported after reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerReport {
    /// The latest snapshot.
    #[serde(flatten)]
    pub snapshot: ServerSnapshot,
    /// First IPv4 address, else first IPv6 address.
    pub ipaddress: Option<String>,
}

impl From<ServerSnapshot> for ServerReport {
    fn from(snapshot: ServerSnapshot) -> Self {
        let ipaddress = snapshot.display_address().map(str::to_string);
        Self {
            snapshot,
            ipaddress,
        }
    }
}

/// Result of a reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    /// Whether anything was, or in dry-run would be, changed.
    pub changed: bool,
    /// The server, when one exists at the end of the pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerReport>,
    /// Human-readable message, when there is no server to report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    /// When the pass finished.
    pub finished_at: DateTime<Utc>,
}

impl ReconcileOutcome {
    fn with_server(changed: bool, snapshot: ServerSnapshot) -> Self {
        Self {
            changed,
            server: Some(snapshot.into()),
            msg: None,
            finished_at: Utc::now(),
        }
    }

    fn with_message(changed: bool, msg: impl Into<String>) -> Self {
        Self {
            changed,
            server: None,
            msg: Some(msg.into()),
            finished_at: Utc::now(),
        }
    }
}

impl<'a, A: ServerApi + ?Sized> Reconciler<'a, A> {
    /// Creates a reconciler that sleeps on the tokio timer with the default
    /// poll policy.
    #[must_use]
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            sleeper: Box::new(TokioSleeper),
            policy: PollPolicy::default(),
            dry_run: false,
        }
    }

    /// Enables or disables dry-run.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the poll policy.
    #[must_use]
    pub const fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the sleeper used between polls.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'a) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    fn waiter(&self) -> StateWaiter<'_, A> {
        StateWaiter::new(self.api, self.sleeper.as_ref(), self.policy)
    }

    /// Looks the server up and decides what to do, without mutating.
    ///
    /// On a locked server the power action is decided from the state seen
    /// once the lock clears, as `reconcile` would.
    ///
    /// # Errors
    ///
    /// Returns a validation conflict if the configuration can neither
    /// identify nor create a server, or any lookup error.
    pub async fn plan(&self, desired: &DesiredServer) -> Result<ReconcilePlan> {
        if desired.serverid.is_none() && desired.hostname.is_none() {
            return Err(ReconcileError::conflict(
                "one of serverid or hostname is required to identify the server",
            )
            .into());
        }

        let snapshot = find_server(
            self.api,
            desired.serverid.as_deref(),
            desired.hostname.as_deref(),
        )
        .await?;

        let decision = decide(desired, snapshot.as_ref());
        if decision == ActionDecision::Create {
            CreateServerRequest::from_desired(desired)?;
        }

        let power = match &snapshot {
            Some(server) if server.is_locked() && desired.state.awaited_state().is_some() => {
                let current = self.waiter().wait_for_unlock(&server.serverid).await?;
                power_transition(desired.state, &current)
            }
            Some(server) => server
                .state
                .as_ref()
                .and_then(|state| power_transition(desired.state, state)),
            None => None,
        };

        debug!("Planned {decision} for {} (power: {power:?})", desired.label());
        Ok(ReconcilePlan {
            snapshot,
            decision,
            power,
        })
    }

    /// Brings the server in line with `desired`.
    ///
    /// # Errors
    ///
    /// Returns the first provider, validation or timeout error; nothing is
    /// retried.
    pub async fn reconcile(&self, desired: &DesiredServer) -> Result<ReconcileOutcome> {
        info!("Reconciling server {} to state {}", desired.label(), desired.state);

        let plan = self.plan(desired).await?;

        if self.dry_run {
            return Ok(Self::preview(desired, plan));
        }

        match (desired.state, plan.snapshot) {
            (TargetState::Absent, None) => {
                info!("Server {} already absent", desired.label());
                Ok(ReconcileOutcome::with_message(false, "Server already absent"))
            }
            (TargetState::Absent, Some(snapshot)) => self.remove(&snapshot.serverid).await,
            (_, snapshot) => self.ensure(desired, snapshot, plan.decision).await,
        }
    }

    /// Turns a plan into the outcome a dry-run reports.
    fn preview(desired: &DesiredServer, plan: ReconcilePlan) -> ReconcileOutcome {
        let changed = plan.has_changes();
        match (plan.decision, plan.snapshot) {
            (ActionDecision::Delete, Some(snapshot)) => ReconcileOutcome::with_message(
                true,
                format!("Server {} would be deleted", snapshot.serverid),
            ),
            (_, Some(snapshot)) => ReconcileOutcome::with_server(changed, snapshot),
            (ActionDecision::Create, None) => ReconcileOutcome::with_message(
                true,
                format!("Server {} would be created", desired.label()),
            ),
            (_, None) => ReconcileOutcome::with_message(false, "Server already absent"),
        }
    }

    async fn remove(&self, server_id: &str) -> Result<ReconcileOutcome> {
        self.waiter().wait_for_unlock(server_id).await?;
        self.api.destroy(server_id).await?;
        info!("Server {server_id} deleted");
        Ok(ReconcileOutcome::with_message(
            true,
            format!("Server {server_id} deleted"),
        ))
    }

    async fn ensure(
        &self,
        desired: &DesiredServer,
        snapshot: Option<ServerSnapshot>,
        decision: ActionDecision,
    ) -> Result<ReconcileOutcome> {
        let waiter = self.waiter();
        let timeout = Duration::from_secs(desired.wait_timeout);
        let mut changed = false;
        let mut created = false;

        let server_id = match (snapshot, decision) {
            (None, _) => {
                let request = CreateServerRequest::from_desired(desired)?;
                let server = self.api.create(&request).await?;
                info!("Created server {} ({})", server.serverid, server.hostname);
                waiter
                    .wait_for_state(&server.serverid, TargetState::Running, timeout)
                    .await?;
                waiter.settle().await;
                changed = true;
                created = true;
                server.serverid
            }
            (Some(server), ActionDecision::Update(set)) => {
                waiter.wait_for_unlock(&server.serverid).await?;
                let updated = self.api.update(&server.serverid, &set.fields).await?;
                changed = true;
                let refreshed = self.api.details(&updated.serverid).await?;
                waiter.wait_for_unlock(&refreshed.serverid).await?;
                refreshed.serverid
            }
            (Some(server), _) => server.serverid,
        };

        let current = waiter.wait_for_unlock(&server_id).await?;

        let action = power_transition(desired.state, &current)
            .filter(|action| !(created && *action == PowerAction::Reboot));
        if let Some(action) = action {
            self.api.power(&server_id, action).await?;
            changed = true;
        }

        if desired.wait {
            waiter
                .wait_for_state(&server_id, desired.state, timeout)
                .await?;
        }

        let snapshot = self.api.details(&server_id).await?;
        Ok(ReconcileOutcome::with_server(changed, snapshot))
    }
}
