mod common;

use common::*;
use dco_core::{
    CUE, CURSOR, Position, TARGET, TargetParameter, TaskError, TrialEvent, TrialState, next_state,
};
use dco_task::{TaskConfig, TimeoutConfig, TrialStateMachine, WorkspaceAdapter};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::cell::RefCell;
use std::rc::Rc;

const HOME: Position = Position::ORIGIN;

#[test]
fn start_block_loads_default_targets() {
    let mut m = machine(1);
    assert_eq!(m.current_state(), TrialState::Inactive);
    assert!(m.targets().is_empty());
    assert_eq!(m.target_index(), None);

    assert!(m.start_block(None).unwrap());
    assert_eq!(m.current_state(), TrialState::Intertrial);
    assert_eq!(m.targets().len(), 8);
    assert_eq!(m.targets()[0].position, Position(1.0, 0.0, 0.0));
    assert_eq!(m.target_index(), None);
}

#[test]
fn start_block_uses_supplied_targets() {
    let mut m = machine(1);
    let entries = vec![TargetParameter::at(0.5, 0.5, 0.0), TargetParameter::at(-0.5, 0.5, 0.0)];
    assert!(m.start_block(Some(entries.clone())).unwrap());
    assert_eq!(m.targets(), entries.as_slice());
}

#[test]
fn empty_target_set_stops_block_start() {
    let mut m = machine(1);
    let err = m.start_block(Some(Vec::new())).unwrap_err();
    assert!(matches!(err, TaskError::InvalidConfiguration(_)));
    assert_eq!(m.current_state(), TrialState::Inactive);
    assert!(m.targets().is_empty());
}

#[test]
fn start_block_is_a_no_op_once_running() {
    let mut m = machine(1);
    drive_to(&mut m, TrialState::HoldA);
    assert!(!m.start_block(Some(vec![TargetParameter::at(0.0, 2.0, 0.0)])).unwrap());
    assert_eq!(m.current_state(), TrialState::HoldA);
    assert_eq!(m.targets().len(), 8);
}

#[test]
fn successful_trial() {
    let mut m = machine(2);
    m.start_block(None).unwrap();
    assert_eq!(names(&m), vec![CURSOR]);

    // intertrial timeout passes through trial_setup into move_a
    assert!(m.trigger(TrialEvent::Timeout).unwrap());
    assert_eq!(m.current_state(), TrialState::MoveA);
    let index = m.target_index().expect("target chosen during setup");
    assert!(index < 8);
    assert_eq!(m.workspace().get_position(TARGET).unwrap(), HOME);
    assert!(!m.workspace().exists(CUE));

    assert!(m.target_engaged().unwrap());
    assert_eq!(m.current_state(), TrialState::HoldA);

    assert!(m.trigger(TrialEvent::Timeout).unwrap());
    assert_eq!(m.current_state(), TrialState::DelayA);
    let outer = m.targets()[index].position;
    assert_eq!(m.workspace().get_position(CUE).unwrap(), outer);
    assert_eq!(m.workspace().get_position(TARGET).unwrap(), HOME);

    assert!(m.trigger(TrialEvent::Timeout).unwrap());
    assert_eq!(m.current_state(), TrialState::MoveB);
    assert!(!m.workspace().exists(CUE));
    assert_eq!(m.workspace().get_position(TARGET).unwrap(), outer);

    assert!(m.target_engaged().unwrap());
    assert_eq!(m.current_state(), TrialState::HoldB);

    assert!(m.trigger(TrialEvent::Timeout).unwrap());
    assert_eq!(m.current_state(), TrialState::MoveC);
    assert_eq!(m.workspace().get_position(TARGET).unwrap(), HOME);

    assert!(m.target_engaged().unwrap());
    assert_eq!(m.current_state(), TrialState::HoldC);

    assert!(m.trigger(TrialEvent::Timeout).unwrap());
    assert_eq!(m.current_state(), TrialState::Success);
    assert!(m.workspace().exists(TARGET));

    // success timeout passes through trial_teardown into intertrial
    assert!(m.trigger(TrialEvent::Timeout).unwrap());
    assert_eq!(m.current_state(), TrialState::Intertrial);
    assert!(!m.workspace().exists(TARGET));
    assert!(!m.workspace().exists(CUE));
    assert_eq!(names(&m), vec![CURSOR]);
    assert_eq!(m.target_index(), Some(index));
}

fn assert_fails_from(state: TrialState, event: TrialEvent) {
    let mut m = machine(3);
    drive_to(&mut m, state);
    assert!(m.trigger(event).unwrap(), "{event} in {state}");
    assert_eq!(m.current_state(), TrialState::Failure);

    assert!(m.trigger(TrialEvent::Timeout).unwrap());
    assert_eq!(m.current_state(), TrialState::Intertrial);
    assert_eq!(names(&m), vec![CURSOR]);
}

#[test]
fn move_timeouts_fail_the_trial() {
    for state in [TrialState::MoveA, TrialState::MoveB, TrialState::MoveC] {
        assert_fails_from(state, TrialEvent::Timeout);
    }
}

#[test]
fn hold_disengagement_fails_the_trial() {
    for state in [TrialState::HoldA, TrialState::HoldB, TrialState::HoldC] {
        assert_fails_from(state, TrialEvent::TargetDisengaged);
    }
}

#[test]
fn disengaging_during_delay_is_ignored() {
    let mut m = machine(4);
    drive_to(&mut m, TrialState::DelayA);
    assert!(!m.target_disengaged().unwrap());
    assert_eq!(m.current_state(), TrialState::DelayA);
    assert!(m.workspace().exists(CUE));
}

#[test]
fn disengaging_during_moves_has_no_effect() {
    for state in [TrialState::MoveA, TrialState::MoveB, TrialState::MoveC] {
        let mut m = machine(5);
        drive_to(&mut m, state);
        let before = m.workspace().get_position(TARGET).unwrap();
        for _ in 0..3 {
            assert!(!m.target_disengaged().unwrap());
        }
        assert_eq!(m.current_state(), state);
        assert_eq!(m.workspace().get_position(TARGET).unwrap(), before);
    }
}

#[test]
fn unlisted_triggers_leave_every_state_unchanged() {
    let resting = [
        TrialState::Inactive,
        TrialState::Intertrial,
        TrialState::MoveA,
        TrialState::HoldA,
        TrialState::DelayA,
        TrialState::MoveB,
        TrialState::HoldB,
        TrialState::MoveC,
        TrialState::HoldC,
        TrialState::Success,
        TrialState::Failure,
    ];
    for state in resting {
        for event in TrialEvent::ALL {
            if next_state(state, event).is_some() {
                continue;
            }
            let mut m = machine(6);
            drive_to(&mut m, state);
            let objects = names(&m);
            let index = m.target_index();
            assert!(!m.trigger(event).unwrap(), "{event} accepted in {state}");
            assert_eq!(m.current_state(), state);
            assert_eq!(names(&m), objects);
            assert_eq!(m.target_index(), index);
        }
    }
}

#[test]
fn triggers_resolve_by_name() {
    let mut m = machine(7);
    assert!(m.trigger_named("start_block").unwrap());
    assert!(m.trigger_named("timeout").unwrap());
    assert_eq!(m.current_state(), TrialState::MoveA);
    assert!(!m.trigger_named("to_move_b").unwrap());
    assert!(!m.trigger_named("").unwrap());
    assert_eq!(m.current_state(), TrialState::MoveA);
    assert!(m.trigger_named("target_engaged").unwrap());
    assert_eq!(m.current_state(), TrialState::HoldA);
}

#[test]
fn start_trial_is_a_manual_alternative_to_the_intertrial_timeout() {
    let mut m = machine(8);
    m.start_block(None).unwrap();
    assert!(m.trigger(TrialEvent::StartTrial).unwrap());
    assert_eq!(m.current_state(), TrialState::MoveA);
}

#[test]
fn consecutive_trials_choose_different_targets() {
    let mut m = machine(9);
    m.start_block(None).unwrap();
    let mut previous = None;
    for _ in 0..50 {
        m.trigger(TrialEvent::Timeout).unwrap();
        let index = m.target_index();
        assert!(index.is_some());
        assert_ne!(index, previous);
        previous = index;
        // move_a timeout, then failure timeout back to intertrial
        m.trigger(TrialEvent::Timeout).unwrap();
        m.trigger(TrialEvent::Timeout).unwrap();
        assert_eq!(m.current_state(), TrialState::Intertrial);
    }
    assert_eq!(m.trial_number(), 50);
}

#[test]
fn end_block_clears_the_workspace_mid_trial() {
    let mut m = machine(10);
    drive_to(&mut m, TrialState::DelayA);
    assert_eq!(names(&m), vec![CURSOR, TARGET, CUE]);

    assert!(m.end_block().unwrap());
    assert_eq!(m.current_state(), TrialState::Inactive);
    assert_eq!(names(&m), vec![CURSOR]);
    assert!(m.targets().is_empty());
    assert_eq!(m.target_index(), None);
    assert!(!m.end_block().unwrap());

    // a new block can start afterwards
    assert!(m.start_block(None).unwrap());
    assert_eq!(m.current_state(), TrialState::Intertrial);
}

#[test]
fn reward_is_issued_once_on_success() {
    let rewarded = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&rewarded);
    let mut m = machine(11).with_reward(move |index: usize| sink.borrow_mut().push(index));

    drive_to(&mut m, TrialState::Success);
    let index = m.target_index().unwrap();
    assert_eq!(*rewarded.borrow(), vec![index]);

    m.trigger(TrialEvent::Timeout).unwrap();
    assert_eq!(rewarded.borrow().len(), 1);
}

#[test]
fn failed_trials_are_not_rewarded() {
    let rewarded = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&rewarded);
    let mut m = machine(12).with_reward(move |_: usize| *sink.borrow_mut() += 1);
    drive_to(&mut m, TrialState::HoldC);
    m.target_disengaged().unwrap();
    m.trigger(TrialEvent::Timeout).unwrap();
    assert_eq!(*rewarded.borrow(), 0);
}

#[test]
fn target_shape_and_color_flow_into_the_cue() {
    let mut m = machine(13);
    let mut entry = TargetParameter::at(0.0, 0.8, 0.0);
    entry.color = Some([1.0, 0.0, 0.0, 0.5]);
    m.start_block(Some(vec![entry])).unwrap();
    for event in [TrialEvent::Timeout, TrialEvent::TargetEngaged, TrialEvent::Timeout] {
        m.trigger(event).unwrap();
    }
    assert_eq!(m.target_index(), Some(0));
    let cue = m.workspace().object(CUE).unwrap();
    assert_eq!(cue.position, Position(0.0, 0.8, 0.0));
    assert_eq!(cue.kind.color, [1.0, 0.0, 0.0, 0.5]);
    assert_eq!(cue.kind.shape, m.config().target.kind().shape);
}

#[test]
fn failed_spawn_keeps_the_last_entered_state() {
    let mut ws = FlakyWorkspace::new();
    ws.fail_spawn = Some(CUE);
    let mut m = flaky_machine(ws);
    drive_to(&mut m, TrialState::HoldA);

    let err = m.trigger(TrialEvent::Timeout).unwrap_err();
    assert!(matches!(err, TaskError::Collaborator(_)));
    assert_eq!(m.current_state(), TrialState::HoldA);
    assert!(!m.workspace().exists(CUE));

    // the caller may route the trial to failure itself
    assert!(m.target_disengaged().unwrap());
    assert!(m.trigger(TrialEvent::Timeout).unwrap());
    assert_eq!(names(&m), vec![CURSOR]);
}

#[test]
fn failed_automatic_hop_stops_in_trial_setup() {
    let mut ws = FlakyWorkspace::new();
    ws.fail_move = Some(TARGET);
    let mut m = flaky_machine(ws);
    m.start_block(None).unwrap();

    assert!(m.trigger(TrialEvent::Timeout).is_err());
    assert_eq!(m.current_state(), TrialState::TrialSetup);
    assert!(m.workspace().exists(TARGET));

    m.workspace_mut().fail_move = None;
    assert!(m.end_block().unwrap());
    assert_eq!(names(&m), vec![CURSOR]);
}

#[test]
fn failed_target_spawn_stays_in_intertrial() {
    let mut ws = FlakyWorkspace::new();
    ws.fail_spawn = Some(TARGET);
    let mut m = flaky_machine(ws);
    m.start_block(None).unwrap();

    assert!(m.trigger(TrialEvent::Timeout).is_err());
    assert_eq!(m.current_state(), TrialState::Intertrial);
    assert_eq!(m.target_index(), None);
}

#[test]
fn failed_target_move_keeps_the_cue_on_screen() {
    let mut m = flaky_machine(FlakyWorkspace::new());
    drive_to(&mut m, TrialState::DelayA);
    let outer = m.current_target().unwrap().position;
    m.workspace_mut().fail_move = Some(TARGET);

    let err = m.trigger(TrialEvent::Timeout).unwrap_err();
    assert!(matches!(err, TaskError::Collaborator(_)));
    assert_eq!(m.current_state(), TrialState::DelayA);
    assert_eq!(names(&m), vec![CURSOR, TARGET, CUE]);
    assert_eq!(m.workspace().get_position(CUE).unwrap(), outer);
    assert_eq!(
        m.workspace().kind_of(CUE).unwrap(),
        m.config().target.kind()
    );
    assert_eq!(m.workspace().get_position(TARGET).unwrap(), HOME);

    m.workspace_mut().fail_move = None;
    assert!(m.trigger(TrialEvent::Timeout).unwrap());
    assert_eq!(m.current_state(), TrialState::MoveB);
    assert_eq!(names(&m), vec![CURSOR, TARGET]);
    assert_eq!(m.workspace().get_position(TARGET).unwrap(), outer);
}

#[test]
fn failed_removal_during_end_block_restores_every_object() {
    let mut m = flaky_machine(FlakyWorkspace::new());
    drive_to(&mut m, TrialState::DelayA);
    let index = m.target_index();
    m.workspace_mut().fail_remove = Some(TARGET);

    assert!(m.end_block().is_err());
    assert_eq!(m.current_state(), TrialState::DelayA);
    assert_eq!(names(&m), vec![CURSOR, TARGET, CUE]);
    assert_eq!(m.target_index(), index);
    assert_eq!(m.targets().len(), 8);

    m.workspace_mut().fail_remove = None;
    assert!(m.end_block().unwrap());
    assert_eq!(names(&m), vec![CURSOR]);
}

#[test]
fn failed_teardown_stays_in_the_outcome_state() {
    let mut m = flaky_machine(FlakyWorkspace::new());
    drive_to(&mut m, TrialState::Failure);
    m.workspace_mut().fail_remove = Some(TARGET);

    assert!(m.trigger(TrialEvent::Timeout).is_err());
    assert_eq!(m.current_state(), TrialState::Failure);
    assert_eq!(names(&m), vec![CURSOR, TARGET]);
}

#[test]
fn invalid_config_stops_block_start() {
    let config = TaskConfig {
        timeouts: TimeoutConfig {
            move_a: -1.0,
            ..TimeoutConfig::default()
        },
        ..TaskConfig::default()
    };
    let mut m = TrialStateMachine::new(config, workspace(), StdRng::seed_from_u64(1));

    let err = m.start_block(None).unwrap_err();
    assert!(matches!(err, TaskError::InvalidConfiguration(msg) if msg.contains("move_a")));
    assert_eq!(m.current_state(), TrialState::Inactive);
    assert!(m.targets().is_empty());

    assert!(m.trigger(TrialEvent::StartBlock).is_err());
    assert_eq!(m.current_state(), TrialState::Inactive);
}
