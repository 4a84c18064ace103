use crate::driver::TransitionDriver;
use crate::schedule::TimeoutSchedule;
use crate::workspace::WorkspaceAdapter;
use dco_core::{TARGET, TargetParameter, TaskError, TrialEvent, TrialState};
use dco_timing::Timer;
use rand::Rng;

/// Turns the clock and the workspace engagement predicate into trial events.
///
/// Nothing runs in the background: the caller invokes [`TrialRunner::update`]
/// once per tick, and every event is applied synchronously.
pub struct TrialRunner<W, R, T>
where
    W: WorkspaceAdapter,
    R: Rng,
    T: Timer<Timestamp = u64>,
{
    driver: TransitionDriver<W, R>,
    timer: T,
    schedule: TimeoutSchedule,
}

impl<W, R, T> TrialRunner<W, R, T>
where
    W: WorkspaceAdapter,
    R: Rng,
    T: Timer<Timestamp = u64>,
{
    pub fn new(driver: TransitionDriver<W, R>, timer: T) -> Self {
        let schedule = TimeoutSchedule::new(driver.machine().config().timeouts.clone());
        Self {
            driver,
            timer,
            schedule,
        }
    }

    pub fn start_block(
        &mut self,
        parameters: Option<Vec<TargetParameter>>,
    ) -> Result<bool, TaskError> {
        let started = self.driver.start_block(parameters)?;
        if started {
            self.rearm();
        }
        Ok(started)
    }

    pub fn end_block(&mut self) -> Result<bool, TaskError> {
        let ended = self.driver.end_block()?;
        self.schedule.disarm();
        Ok(ended)
    }

    /// The event the current state is waiting for, if it has happened.
    ///
    /// Engagement changes take precedence over an expired timeout.
    pub fn pending_event(&self) -> Result<Option<TrialEvent>, TaskError> {
        let state = self.driver.current_state();
        let workspace = self.driver.machine().workspace();
        if state.is_move() && workspace.is_engaged(TARGET)? {
            return Ok(Some(TrialEvent::TargetEngaged));
        }
        if state.is_hold() && !workspace.is_engaged(TARGET)? {
            return Ok(Some(TrialEvent::TargetDisengaged));
        }
        if self.schedule.armed_for() == Some(state) && self.schedule.expired(self.timer.now()) {
            return Ok(Some(TrialEvent::Timeout));
        }
        Ok(None)
    }

    /// Applies pending events until the machine settles; returns them in order.
    pub fn update(&mut self) -> Result<Vec<TrialEvent>, TaskError> {
        let mut applied = Vec::new();
        for _ in 0..TrialState::ALL.len() {
            if self.schedule.armed_for() != Some(self.driver.current_state()) {
                self.rearm();
            }
            let Some(event) = self.pending_event()? else {
                break;
            };
            if !self.driver.trigger(event)? {
                break;
            }
            applied.push(event);
            self.rearm();
        }
        Ok(applied)
    }

    fn rearm(&mut self) {
        let now = self.timer.now();
        self.schedule.arm(self.driver.current_state(), now);
    }

    pub fn driver(&self) -> &TransitionDriver<W, R> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut TransitionDriver<W, R> {
        &mut self.driver
    }

    pub fn workspace(&self) -> &W {
        self.driver.machine().workspace()
    }

    pub fn workspace_mut(&mut self) -> &mut W {
        self.driver.machine_mut().workspace_mut()
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn schedule(&self) -> &TimeoutSchedule {
        &self.schedule
    }
}
