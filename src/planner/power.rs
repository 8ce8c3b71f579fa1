//! Power transitions by target state.

use crate::config::TargetState;
use crate::glesys::{PowerAction, PowerState};

/// Returns the power action that moves a server in `current` state towards
/// `target`, or `None` if nothing needs to be sent.
///
/// `rebooted` always maps to a reboot, since a reboot is an action rather
/// than a resting state.
///
/// Unknown states are not waited out: they count as neither running nor
/// stopped, so `running` starts and `stopped` stops them.
#[must_use]
pub fn power_transition(target: TargetState, current: &PowerState) -> Option<PowerAction> {
    match target {
        TargetState::Present | TargetState::Absent => None,
        TargetState::Running => (*current != PowerState::Running).then_some(PowerAction::Start),
        TargetState::Stopped => (*current != PowerState::Stopped).then_some(PowerAction::Stop),
        TargetState::Rebooted => Some(PowerAction::Reboot),
    }
}
