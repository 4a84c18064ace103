use crate::state::{TrialEvent, TrialState};

/// Transition table of the task, keyed by `(current state, event)`.
///
/// Returns `None` when the event is not accepted in `state`. Every row names
/// every event and neither match has a wildcard, so a new state or event
/// does not compile until each row says what it does with it.
pub fn next_state(state: TrialState, event: TrialEvent) -> Option<TrialState> {
    use TrialEvent as E;
    use TrialState as S;

    match state {
        S::Inactive => match event {
            E::StartBlock => Some(S::Intertrial),
            E::EndBlock
            | E::StartTrial
            | E::Timeout
            | E::TargetEngaged
            | E::TargetDisengaged
            | E::Begin
            | E::EndTrial => None,
        },
        S::Intertrial => match event {
            E::Timeout | E::StartTrial => Some(S::TrialSetup),
            E::EndBlock => Some(S::Inactive),
            E::StartBlock | E::TargetEngaged | E::TargetDisengaged | E::Begin | E::EndTrial => {
                None
            }
        },
        S::TrialSetup => match event {
            E::Begin => Some(S::MoveA),
            E::EndBlock => Some(S::Inactive),
            E::StartBlock
            | E::StartTrial
            | E::Timeout
            | E::TargetEngaged
            | E::TargetDisengaged
            | E::EndTrial => None,
        },
        S::MoveA => match event {
            E::TargetEngaged => Some(S::HoldA),
            E::Timeout => Some(S::Failure),
            E::EndBlock => Some(S::Inactive),
            E::StartBlock | E::StartTrial | E::TargetDisengaged | E::Begin | E::EndTrial => None,
        },
        S::HoldA => match event {
            E::Timeout => Some(S::DelayA),
            E::TargetDisengaged => Some(S::Failure),
            E::EndBlock => Some(S::Inactive),
            E::StartBlock | E::StartTrial | E::TargetEngaged | E::Begin | E::EndTrial => None,
        },
        S::DelayA => match event {
            E::Timeout => Some(S::MoveB),
            E::EndBlock => Some(S::Inactive),
            E::StartBlock
            | E::StartTrial
            | E::TargetEngaged
            | E::TargetDisengaged
            | E::Begin
            | E::EndTrial => None,
        },
        S::MoveB => match event {
            E::TargetEngaged => Some(S::HoldB),
            E::Timeout => Some(S::Failure),
            E::EndBlock => Some(S::Inactive),
            E::StartBlock | E::StartTrial | E::TargetDisengaged | E::Begin | E::EndTrial => None,
        },
        S::HoldB => match event {
            E::Timeout => Some(S::MoveC),
            E::TargetDisengaged => Some(S::Failure),
            E::EndBlock => Some(S::Inactive),
            E::StartBlock | E::StartTrial | E::TargetEngaged | E::Begin | E::EndTrial => None,
        },
        S::MoveC => match event {
            E::TargetEngaged => Some(S::HoldC),
            E::Timeout => Some(S::Failure),
            E::EndBlock => Some(S::Inactive),
            E::StartBlock | E::StartTrial | E::TargetDisengaged | E::Begin | E::EndTrial => None,
        },
        S::HoldC => match event {
            E::Timeout => Some(S::Success),
            E::TargetDisengaged => Some(S::Failure),
            E::EndBlock => Some(S::Inactive),
            E::StartBlock | E::StartTrial | E::TargetEngaged | E::Begin | E::EndTrial => None,
        },
        S::Success | S::Failure => match event {
            E::Timeout => Some(S::TrialTeardown),
            E::EndBlock => Some(S::Inactive),
            E::StartBlock
            | E::StartTrial
            | E::TargetEngaged
            | E::TargetDisengaged
            | E::Begin
            | E::EndTrial => None,
        },
        S::TrialTeardown => match event {
            E::EndTrial => Some(S::Intertrial),
            E::EndBlock => Some(S::Inactive),
            E::StartBlock
            | E::StartTrial
            | E::Timeout
            | E::TargetEngaged
            | E::TargetDisengaged
            | E::Begin => None,
        },
    }
}
