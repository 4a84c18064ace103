#![allow(dead_code)]

use dco_core::{ObjectKind, Position, TrialEvent, TrialState, WorkspaceError};
use dco_task::{MemoryWorkspace, TaskConfig, TrialStateMachine, WorkspaceAdapter};
use rand::SeedableRng;
use rand::rngs::StdRng;

pub type Machine<W = MemoryWorkspace> = TrialStateMachine<W, StdRng>;

pub fn workspace() -> MemoryWorkspace {
    MemoryWorkspace::new(TaskConfig::default().cursor.kind())
}

pub fn machine(seed: u64) -> Machine {
    TrialStateMachine::new(TaskConfig::default(), workspace(), StdRng::seed_from_u64(seed))
}

/// Events leading from `inactive` to `state`
pub fn path_to(state: TrialState) -> Vec<TrialEvent> {
    use TrialEvent::*;
    let success = [
        StartBlock,
        Timeout,
        TargetEngaged,
        Timeout,
        Timeout,
        TargetEngaged,
        Timeout,
        TargetEngaged,
        Timeout,
    ];
    let steps = match state {
        TrialState::Inactive => 0,
        TrialState::Intertrial => 1,
        TrialState::MoveA => 2,
        TrialState::HoldA => 3,
        TrialState::DelayA => 4,
        TrialState::MoveB => 5,
        TrialState::HoldB => 6,
        TrialState::MoveC => 7,
        TrialState::HoldC => 8,
        TrialState::Success => 9,
        TrialState::Failure => return vec![StartBlock, Timeout, Timeout],
        TrialState::TrialSetup | TrialState::TrialTeardown => {
            panic!("{state} is left automatically and cannot be rested in")
        }
    };
    success[..steps].to_vec()
}

pub fn drive_to<W: WorkspaceAdapter>(machine: &mut Machine<W>, state: TrialState) {
    for event in path_to(state) {
        assert!(
            machine.trigger(event).unwrap(),
            "{event} rejected in {}",
            machine.current_state()
        );
    }
    assert_eq!(machine.current_state(), state);
}

pub fn names<W: WorkspaceAdapter>(machine: &Machine<W>) -> Vec<String> {
    machine.workspace().object_names()
}

/// Delegates to a [`MemoryWorkspace`] but fails chosen operations
pub struct FlakyWorkspace {
    pub inner: MemoryWorkspace,
    pub fail_spawn: Option<&'static str>,
    pub fail_move: Option<&'static str>,
    pub fail_remove: Option<&'static str>,
}

impl FlakyWorkspace {
    pub fn new() -> Self {
        Self {
            inner: workspace(),
            fail_spawn: None,
            fail_move: None,
            fail_remove: None,
        }
    }

    fn refuse(name: &str) -> WorkspaceError {
        WorkspaceError::Rejected {
            name: name.to_string(),
            reason: "renderer offline".into(),
        }
    }
}

impl WorkspaceAdapter for FlakyWorkspace {
    fn exists(&self, name: &str) -> bool {
        self.inner.exists(name)
    }

    fn get_position(&self, name: &str) -> Result<Position, WorkspaceError> {
        self.inner.get_position(name)
    }

    fn kind_of(&self, name: &str) -> Result<ObjectKind, WorkspaceError> {
        self.inner.kind_of(name)
    }

    fn spawn(&mut self, name: &str, position: Position, kind: &ObjectKind) -> Result<(), WorkspaceError> {
        if self.fail_spawn == Some(name) {
            return Err(Self::refuse(name));
        }
        self.inner.spawn(name, position, kind)
    }

    fn move_to(&mut self, name: &str, position: Position) -> Result<(), WorkspaceError> {
        if self.fail_move == Some(name) {
            return Err(Self::refuse(name));
        }
        self.inner.move_to(name, position)
    }

    fn remove(&mut self, name: &str) -> Result<(), WorkspaceError> {
        if self.fail_remove == Some(name) {
            return Err(Self::refuse(name));
        }
        self.inner.remove(name)
    }

    fn object_names(&self) -> Vec<String> {
        self.inner.object_names()
    }

    fn is_engaged(&self, name: &str) -> Result<bool, WorkspaceError> {
        self.inner.is_engaged(name)
    }
}

pub fn flaky_machine(workspace: FlakyWorkspace) -> Machine<FlakyWorkspace> {
    TrialStateMachine::new(TaskConfig::default(), workspace, StdRng::seed_from_u64(5))
}
