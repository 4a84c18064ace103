use crate::error::UnknownName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Phases of a delayed center-out, out-center trial
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialState {
    Inactive,
    Intertrial,
    TrialSetup,
    MoveA,
    HoldA,
    DelayA,
    MoveB,
    HoldB,
    MoveC,
    HoldC,
    Success,
    Failure,
    TrialTeardown,
}

impl Default for TrialState {
    fn default() -> Self {
        TrialState::Inactive
    }
}

impl TrialState {
    pub const ALL: [TrialState; 13] = [
        TrialState::Inactive,
        TrialState::Intertrial,
        TrialState::TrialSetup,
        TrialState::MoveA,
        TrialState::HoldA,
        TrialState::DelayA,
        TrialState::MoveB,
        TrialState::HoldB,
        TrialState::MoveC,
        TrialState::HoldC,
        TrialState::Success,
        TrialState::Failure,
        TrialState::TrialTeardown,
    ];

    pub fn name(&self) -> &'static str {
        use TrialState::*;
        match self {
            Inactive => "inactive",
            Intertrial => "intertrial",
            TrialSetup => "trial_setup",
            MoveA => "move_a",
            HoldA => "hold_a",
            DelayA => "delay_a",
            MoveB => "move_b",
            HoldB => "hold_b",
            MoveC => "move_c",
            HoldC => "hold_c",
            Success => "success",
            Failure => "failure",
            TrialTeardown => "trial_teardown",
        }
    }

    /// States in which the cursor is travelling toward the target
    pub fn is_move(&self) -> bool {
        matches!(self, Self::MoveA | Self::MoveB | Self::MoveC)
    }

    /// States in which the cursor must stay on the target
    pub fn is_hold(&self) -> bool {
        matches!(self, Self::HoldA | Self::HoldB | Self::HoldC)
    }

    /// True between `trial_setup` and `trial_teardown`, inclusive.
    pub fn in_trial(&self) -> bool {
        !matches!(self, Self::Inactive | Self::Intertrial)
    }

    pub fn is_outcome(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }

    /// Event fired on entry without waiting for a caller.
    pub fn automatic_event(&self) -> Option<TrialEvent> {
        match self {
            Self::TrialSetup => Some(TrialEvent::Begin),
            Self::TrialTeardown => Some(TrialEvent::EndTrial),
            _ => None,
        }
    }

    /// Whether an external clock is expected to deliver `timeout` here.
    pub fn has_timeout(&self) -> bool {
        !matches!(
            self,
            Self::Inactive | Self::TrialSetup | Self::TrialTeardown
        )
    }
}

impl fmt::Display for TrialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrialState {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.name() == s)
            .ok_or_else(|| UnknownName {
                kind: "state",
                name: s.to_string(),
            })
    }
}

/// Triggers understood by the trial state machine
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialEvent {
    StartBlock,
    StartTrial,
    Timeout,
    TargetEngaged,
    TargetDisengaged,
    /// Automatic hop out of `trial_setup`
    Begin,
    /// Automatic hop out of `trial_teardown`
    EndTrial,
    EndBlock,
}

impl TrialEvent {
    pub const ALL: [TrialEvent; 8] = [
        TrialEvent::StartBlock,
        TrialEvent::StartTrial,
        TrialEvent::Timeout,
        TrialEvent::TargetEngaged,
        TrialEvent::TargetDisengaged,
        TrialEvent::Begin,
        TrialEvent::EndTrial,
        TrialEvent::EndBlock,
    ];

    pub fn name(&self) -> &'static str {
        use TrialEvent::*;
        match self {
            StartBlock => "start_block",
            StartTrial => "start_trial",
            Timeout => "timeout",
            TargetEngaged => "target_engaged",
            TargetDisengaged => "target_disengaged",
            Begin => "begin",
            EndTrial => "end_trial",
            EndBlock => "end_block",
        }
    }
}

impl fmt::Display for TrialEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrialEvent {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.name() == s)
            .ok_or_else(|| UnknownName {
                kind: "event",
                name: s.to_string(),
            })
    }
}
