use crate::state::{TrialEvent, TrialState};
use serde::{Deserialize, Serialize};

/// One completed state change, as reported to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: TrialState,
    pub to: TrialState,
    pub event: TrialEvent,
    /// Set on hops chained from `trial_setup` or `trial_teardown`
    pub automatic: bool,
}

impl Transition {
    /// Outcome of the trial, if this transition decided it
    pub fn outcome(&self) -> Option<TrialOutcome> {
        match self.to {
            TrialState::Success => Some(TrialOutcome::Success),
            TrialState::Failure => Some(TrialOutcome::Failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialOutcome {
    Success,
    Failure,
}
