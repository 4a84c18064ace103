use crate::machine::TrialStateMachine;
use crate::workspace::WorkspaceAdapter;
use dco_core::{TargetParameter, TaskError, Transition, TrialEvent, TrialState};
use rand::Rng;
use tracing::info;

/// Receives every completed hop, automatic ones included
pub trait TransitionObserver {
    fn on_transition(&mut self, transition: &Transition);
}

impl<F: FnMut(&Transition)> TransitionObserver for F {
    fn on_transition(&mut self, transition: &Transition) {
        self(transition)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl TransitionObserver for NoopObserver {
    fn on_transition(&mut self, _: &Transition) {}
}

/// Logs `State: <name>` for each hop
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TransitionObserver for TracingObserver {
    fn on_transition(&mut self, t: &Transition) {
        info!(
            from = %t.from,
            event = %t.event,
            automatic = t.automatic,
            "State: {}",
            t.to
        );
    }
}

/// Front end of a [`TrialStateMachine`] that reports hops to an observer.
///
/// A chained hop out of `trial_setup` or `trial_teardown` is reported as a
/// second transition with `automatic` set, after the one that entered it.
/// Without an observer the machine behaves identically.
pub struct TransitionDriver<W, R>
where
    W: WorkspaceAdapter,
    R: Rng,
{
    machine: TrialStateMachine<W, R>,
    observer: Option<Box<dyn TransitionObserver>>,
}

impl<W, R> TransitionDriver<W, R>
where
    W: WorkspaceAdapter,
    R: Rng,
{
    pub fn new(machine: TrialStateMachine<W, R>, observer: Option<Box<dyn TransitionObserver>>) -> Self {
        Self { machine, observer }
    }

    pub fn silent(machine: TrialStateMachine<W, R>) -> Self {
        Self::new(machine, None)
    }

    pub fn observed(machine: TrialStateMachine<W, R>, observer: impl TransitionObserver + 'static) -> Self {
        Self::new(machine, Some(Box::new(observer)))
    }

    pub fn start_block(&mut self, parameters: Option<Vec<TargetParameter>>) -> Result<bool, TaskError> {
        match self.observer.as_mut() {
            Some(observer) => self.machine.start_block_observed(parameters, &mut **observer),
            None => self.machine.start_block(parameters),
        }
    }

    pub fn trigger(&mut self, event: TrialEvent) -> Result<bool, TaskError> {
        match self.observer.as_mut() {
            Some(observer) => self.machine.dispatch(event, &mut **observer),
            None => self.machine.trigger(event),
        }
    }

    pub fn trigger_named(&mut self, name: &str) -> Result<bool, TaskError> {
        match self.observer.as_mut() {
            Some(observer) => self.machine.dispatch_named(name, &mut **observer),
            None => self.machine.trigger_named(name),
        }
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

    pub fn current_state(&self) -> TrialState {
        self.machine.current_state()
    }

    pub fn target_index(&self) -> Option<usize> {
        self.machine.target_index()
    }

    pub fn targets(&self) -> &[TargetParameter] {
        self.machine.targets()
    }

    pub fn machine(&self) -> &TrialStateMachine<W, R> {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut TrialStateMachine<W, R> {
        &mut self.machine
    }

    pub fn into_machine(self) -> TrialStateMachine<W, R> {
        self.machine
    }
}
