//! Diff engine for comparing the desired server with its snapshot.
//!
//! [`decide`] is a pure function of the desired configuration and the
//! observed snapshot. It never performs I/O.

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::config::{DesiredServer, TargetState};
use crate::glesys::{ServerSnapshot, UpdateFields};

/// The action a reconciliation should take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ActionDecision {
    /// Nothing to change.
    NoOp,
    /// The server does not exist and must be created.
    Create,
    /// The server exists and some fields differ.
    Update(FieldSet),
    /// The server exists and must be deleted.
    Delete,
}

impl ActionDecision {
    /// Returns true if the decision leads to a mutating call.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        !matches!(self, Self::NoOp)
    }
}

impl fmt::Display for ActionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOp => write!(f, "no-op"),
            Self::Create => write!(f, "create"),
            Self::Update(set) => write!(f, "update ({})", set.fields.names().join(", ")),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Fields to edit, with the values they change from and to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldSet {
    /// The request payload.
    pub fields: UpdateFields,
    /// One entry per changed field.
    pub changes: Vec<FieldChange>,
}

impl FieldSet {
    /// Returns true if no field differs.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Detail about a single differing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    /// Field that differs, as named by the API.
    pub field: &'static str,
    /// Value on the server.
    pub current: Option<String>,
    /// Value asked for.
    pub desired: String,
}

/// Decides what to do with the server.
///
/// Deletion wins over any field difference. Unset desired fields never enter
/// the field set, and bandwidth is only compared when the server reports it
/// can be edited.
#[must_use]
pub fn decide(desired: &DesiredServer, snapshot: Option<&ServerSnapshot>) -> ActionDecision {
    let Some(snapshot) = snapshot else {
        return if desired.state == TargetState::Absent {
            ActionDecision::NoOp
        } else {
            ActionDecision::Create
        };
    };

    if desired.state == TargetState::Absent {
        return ActionDecision::Delete;
    }

    let set = field_set(desired, snapshot);
    if set.is_empty() {
        ActionDecision::NoOp
    } else {
        ActionDecision::Update(set)
    }
}

/// Computes the fields whose desired value is set and differs from the
/// snapshot.
#[must_use]
pub fn field_set(desired: &DesiredServer, snapshot: &ServerSnapshot) -> FieldSet {
    let mut set = FieldSet::default();

    if let Some(cpus) = differs(desired.cpus, snapshot.cpucores) {
        set.fields.cpucores = Some(cpus);
        set.push("cpucores", snapshot.cpucores, cpus);
    }
    if let Some(disk) = differs(desired.disk, snapshot.disksize) {
        set.fields.disksize = Some(disk);
        set.push("disksize", snapshot.disksize, disk);
    }
    if let Some(memory) = differs(desired.memory, snapshot.memorysize) {
        set.fields.memorysize = Some(memory);
        set.push("memorysize", snapshot.memorysize, memory);
    }
    if let Some(bandwidth) = differs(desired.bandwidth, snapshot.bandwidth) {
        if snapshot.supportedfeatures.editbandwidth {
            set.fields.bandwidth = Some(bandwidth);
            set.push("bandwidth", snapshot.bandwidth, bandwidth);
        } else {
            debug!(
                "Ignoring bandwidth difference on {}: not editable for this server",
                snapshot.serverid
            );
        }
    }
    if let Some(hostname) = desired
        .hostname
        .as_ref()
        .filter(|h| **h != snapshot.hostname)
    {
        set.fields.hostname = Some(hostname.clone());
        set.changes.push(FieldChange {
            field: "hostname",
            current: Some(snapshot.hostname.clone()),
            desired: hostname.clone(),
        });
    }

    set
}

impl FieldSet {
    fn push(&mut self, field: &'static str, current: Option<u32>, desired: u32) {
        self.changes.push(FieldChange {
            field,
            current: current.map(|v| v.to_string()),
            desired: desired.to_string(),
        });
    }
}

fn differs(desired: Option<u32>, current: Option<u32>) -> Option<u32> {
    desired.filter(|d| Some(*d) != current)
}
