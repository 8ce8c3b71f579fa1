//! Planning module for reconciliation.
//!
//! This module compares the desired server with its snapshot and maps
//! target states to power actions.

mod diff;
mod power;

pub use diff::{decide, field_set, ActionDecision, FieldChange, FieldSet};
pub use power::power_transition;
