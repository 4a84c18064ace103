use crate::config::TaskConfig;
use crate::driver::{NoopObserver, TransitionObserver};
use crate::targets::TargetParameterSet;
use crate::workspace::WorkspaceAdapter;
use dco_core::{
    CUE, CURSOR, ObjectKind, Position, TARGET, TargetParameter, TaskError, Transition,
    TrialEvent, TrialState, next_state,
};
use rand::Rng;
use tracing::{debug, info, trace, warn};

/// Receives the reward signal when a trial enters `success`
pub trait RewardSink {
    fn reward(&mut self, target_index: usize);
}

impl<F: FnMut(usize)> RewardSink for F {
    fn reward(&mut self, target_index: usize) {
        self(target_index)
    }
}

/// Workspace change made by the hop in progress, kept so it can be reverted
#[derive(Debug)]
enum Undo {
    Spawned(String),
    Moved(String, Position),
    Removed(String, Position, ObjectKind),
}

/// Controller of the delayed center-out, out-center trial.
///
/// Owns the current state and the chosen target index; the workspace is
/// only ever reached through [`WorkspaceAdapter`] calls. Side effects of a
/// hop run before the state is committed. When a collaborator call fails,
/// the workspace changes already made by that hop are reverted and the
/// machine stays in the last state it fully entered.
pub struct TrialStateMachine<W, R>
where
    W: WorkspaceAdapter,
    R: Rng,
{
    state: TrialState,
    workspace: W,
    rng: R,
    config: TaskConfig,
    targets: Option<TargetParameterSet>,
    target_index: Option<usize>,
    trial_number: usize,
    reward: Option<Box<dyn RewardSink>>,
    journal: Vec<Undo>,
}

impl<W, R> TrialStateMachine<W, R>
where
    W: WorkspaceAdapter,
    R: Rng,
{
    pub fn new(config: TaskConfig, workspace: W, rng: R) -> Self {
        Self {
            state: TrialState::Inactive,
            workspace,
            rng,
            config,
            targets: None,
            target_index: None,
            trial_number: 0,
            reward: None,
            journal: Vec::new(),
        }
    }

    pub fn with_reward(mut self, sink: impl RewardSink + 'static) -> Self {
        self.reward = Some(Box::new(sink));
        self
    }

    /// Loads the block's targets and moves to `intertrial`.
    ///
    /// Returns `Ok(false)` outside `inactive`. An invalid config or an empty
    /// or malformed set is an error and leaves the machine `inactive`.
    pub fn start_block(
        &mut self,
        parameters: Option<Vec<TargetParameter>>,
    ) -> Result<bool, TaskError> {
        self.start_block_observed(parameters, &mut NoopObserver)
    }

    pub fn start_block_observed<O>(
        &mut self,
        parameters: Option<Vec<TargetParameter>>,
        observer: &mut O,
    ) -> Result<bool, TaskError>
    where
        O: TransitionObserver + ?Sized,
    {
        if self.state != TrialState::Inactive {
            debug!(state = %self.state, "start_block ignored, block already running");
            return Ok(false);
        }
        self.config.validate()?;
        let targets = self.load_targets(parameters)?;
        self.targets = Some(targets);
        let started = self.dispatch(TrialEvent::StartBlock, observer);
        if started.is_err() {
            self.targets = None;
        }
        started
    }

    pub fn trigger(&mut self, event: TrialEvent) -> Result<bool, TaskError> {
        self.dispatch(event, &mut NoopObserver)
    }

    /// Looks `name` up in the event table; unknown names are rejected triggers.
    pub fn trigger_named(&mut self, name: &str) -> Result<bool, TaskError> {
        self.dispatch_named(name, &mut NoopObserver)
    }

    pub fn target_engaged(&mut self) -> Result<bool, TaskError> {
        self.trigger(TrialEvent::TargetEngaged)
    }

    pub fn target_disengaged(&mut self) -> Result<bool, TaskError> {
        self.trigger(TrialEvent::TargetDisengaged)
    }

    pub fn end_block(&mut self) -> Result<bool, TaskError> {
        self.trigger(TrialEvent::EndBlock)
    }

    pub(crate) fn dispatch_named<O>(&mut self, name: &str, observer: &mut O) -> Result<bool, TaskError>
    where
        O: TransitionObserver + ?Sized,
    {
        match name.parse::<TrialEvent>() {
            Ok(event) => self.dispatch(event, observer),
            Err(e) => {
                debug!(state = %self.state, error = %e, "trigger rejected");
                Ok(false)
            }
        }
    }

    /// Applies `event` and then any automatic hops it leads to, reporting
    /// every hop to `observer` in order.
    pub fn dispatch<O>(&mut self, event: TrialEvent, observer: &mut O) -> Result<bool, TaskError>
    where
        O: TransitionObserver + ?Sized,
    {
        let Some(transition) = self.step(event, false)? else {
            debug!(state = %self.state, event = %event, "trigger rejected");
            return Ok(false);
        };
        observer.on_transition(&transition);

        let mut next = transition.to.automatic_event();
        while let Some(event) = next {
            match self.step(event, true)? {
                Some(transition) => {
                    observer.on_transition(&transition);
                    next = transition.to.automatic_event();
                }
                None => break,
            }
        }
        Ok(true)
    }

    fn step(&mut self, event: TrialEvent, automatic: bool) -> Result<Option<Transition>, TaskError> {
        let from = self.state;
        let Some(to) = next_state(from, event) else {
            return Ok(None);
        };
        self.journal.clear();
        if let Err(e) = self.apply(from, to) {
            self.rollback();
            return Err(e);
        }
        self.journal.clear();
        self.state = to;
        trace!(%from, %to, %event, automatic, "state changed");
        Ok(Some(Transition {
            from,
            to,
            event,
            automatic,
        }))
    }

    fn apply(&mut self, from: TrialState, to: TrialState) -> Result<(), TaskError> {
        self.exit(from)?;
        self.enter(from, to)
    }

    fn exit(&mut self, from: TrialState) -> Result<(), TaskError> {
        if from == TrialState::DelayA && self.workspace.exists(CUE) {
            self.remove(CUE)?;
        }
        Ok(())
    }

    fn spawn(&mut self, name: &str, position: Position, kind: &ObjectKind) -> Result<(), TaskError> {
        self.workspace.spawn(name, position, kind)?;
        self.journal.push(Undo::Spawned(name.to_string()));
        Ok(())
    }

    fn move_to(&mut self, name: &str, position: Position) -> Result<(), TaskError> {
        let previous = self.workspace.get_position(name)?;
        self.workspace.move_to(name, position)?;
        self.journal.push(Undo::Moved(name.to_string(), previous));
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), TaskError> {
        let position = self.workspace.get_position(name)?;
        let kind = self.workspace.kind_of(name)?;
        self.workspace.remove(name)?;
        self.journal.push(Undo::Removed(name.to_string(), position, kind));
        Ok(())
    }

    /// Reverts the journaled changes, newest first.
    fn rollback(&mut self) {
        while let Some(undo) = self.journal.pop() {
            let reverted = match &undo {
                Undo::Spawned(name) => self.workspace.remove(name),
                Undo::Moved(name, position) => self.workspace.move_to(name, *position),
                Undo::Removed(name, position, kind) => self.workspace.spawn(name, *position, kind),
            };
            if let Err(e) = reverted {
                warn!(?undo, error = %e, "could not revert workspace change");
            }
        }
    }

    fn enter(&mut self, from: TrialState, to: TrialState) -> Result<(), TaskError> {
        match to {
            TrialState::Inactive => {
                let names = self.workspace.object_names();
                for name in names.iter().filter(|n| n.as_str() != CURSOR) {
                    self.remove(name)?;
                }
                self.targets = None;
                self.target_index = None;
                info!(trials = self.trial_number, "block ended");
                self.trial_number = 0;
            }
            TrialState::Intertrial if from == TrialState::Inactive => {
                self.config.validate()?;
                if self.targets.is_none() {
                    self.targets = Some(self.load_targets(None)?);
                }
                info!(targets = self.targets().len(), "block started");
            }
            TrialState::TrialSetup => {
                if self.targets.is_none() {
                    return Err(TaskError::InvalidConfiguration(
                        "trial started without a loaded target set".into(),
                    ));
                }
                let kind = self.config.target.kind();
                self.spawn(TARGET, self.config.home, &kind)?;
                if let Some(targets) = self.targets.as_mut() {
                    let index = targets.select(self.target_index, &mut self.rng);
                    self.target_index = Some(index);
                    self.trial_number += 1;
                    debug!(trial = self.trial_number, target_index = index, "trial set up");
                }
            }
            TrialState::MoveA | TrialState::MoveC => {
                self.move_to(TARGET, self.config.home)?;
            }
            TrialState::DelayA => {
                let target = self.chosen_target()?;
                let kind = target.kind_or(&self.config.target.kind());
                let position = target.position;
                self.spawn(CUE, position, &kind)?;
            }
            TrialState::MoveB => {
                let position = self.chosen_target()?.position;
                self.move_to(TARGET, position)?;
            }
            TrialState::Success => {
                let index = self.target_index.unwrap_or_default();
                info!(trial = self.trial_number, target_index = index, "trial succeeded");
                if let Some(sink) = self.reward.as_mut() {
                    sink.reward(index);
                }
            }
            TrialState::Failure => {
                info!(
                    trial = self.trial_number,
                    target_index = ?self.target_index,
                    failed_in = %from,
                    "trial failed"
                );
            }
            TrialState::TrialTeardown => {
                for name in [CUE, TARGET] {
                    if self.workspace.exists(name) {
                        self.remove(name)?;
                    }
                }
            }
            TrialState::Intertrial
            | TrialState::HoldA
            | TrialState::HoldB
            | TrialState::HoldC => {}
        }
        Ok(())
    }

    fn load_targets(
        &self,
        parameters: Option<Vec<TargetParameter>>,
    ) -> Result<TargetParameterSet, TaskError> {
        let set = match (parameters, &self.config.targets_path) {
            (Some(entries), _) => TargetParameterSet::load(Some(entries))?,
            (None, Some(path)) => TargetParameterSet::from_json_file(path)?,
            (None, None) => TargetParameterSet::load(None)?,
        };
        Ok(set.with_policy(self.config.selection))
    }

    fn chosen_target(&self) -> Result<&TargetParameter, TaskError> {
        self.current_target().ok_or_else(|| {
            TaskError::InvalidConfiguration("no target chosen for the current trial".into())
        })
    }

    pub fn current_state(&self) -> TrialState {
        self.state
    }

    /// Index chosen by the most recent `trial_setup` of this block
    pub fn target_index(&self) -> Option<usize> {
        self.target_index
    }

    /// Targets of the active block; empty while inactive
    pub fn targets(&self) -> &[TargetParameter] {
        self.targets
            .as_ref()
            .map(TargetParameterSet::as_slice)
            .unwrap_or(&[])
    }

    pub fn current_target(&self) -> Option<&TargetParameter> {
        let index = self.target_index?;
        self.targets.as_ref()?.get(index)
    }

    /// Trials started in the current block
    pub fn trial_number(&self) -> usize {
        self.trial_number
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn workspace(&self) -> &W {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut W {
        &mut self.workspace
    }
}
