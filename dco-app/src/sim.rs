use anyhow::{Context, Result};
use dco_core::{Position, TARGET, Transition, TrialState};
use dco_task::{
    MemoryWorkspace, TaskConfig, TracingObserver, TransitionDriver, TransitionObserver,
    TrialRunner, TrialStateMachine, WorkspaceAdapter,
};
use dco_timing::Timer;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

/// Outcome counts for a simulated block
#[derive(Debug, Default, Clone, Serialize)]
pub struct Tally {
    pub successes: usize,
    pub failures: usize,
    /// Failures keyed by the state the trial failed in
    pub failed_in: BTreeMap<String, usize>,
}

impl Tally {
    fn record(&mut self, t: &Transition) {
        match t.to {
            TrialState::Success => self.successes += 1,
            TrialState::Failure => {
                self.failures += 1;
                *self.failed_in.entry(t.from.to_string()).or_default() += 1;
            }
            _ => {}
        }
    }

    pub fn completed(&self) -> usize {
        self.successes + self.failures
    }
}

/// Stand-in for a subject moving the cursor
pub struct Subject {
    rng: StdRng,
    /// Units per second
    speed: f64,
    lapse_rate: f64,
    lapsing: bool,
    trial_seen: usize,
}

impl Subject {
    pub fn new(rng: StdRng, speed: f64, lapse_rate: f64) -> Self {
        Self {
            rng,
            speed,
            lapse_rate,
            lapsing: false,
            trial_seen: 0,
        }
    }

    /// Moves the cursor one tick toward wherever the subject is heading.
    ///
    /// A lapsing subject drifts home while it should hold the outer target.
    fn step<T>(&mut self, runner: &mut TrialRunner<MemoryWorkspace, StdRng, T>, dt: Duration) -> Result<()>
    where
        T: Timer<Timestamp = u64>,
    {
        let machine = runner.driver().machine();
        let state = machine.current_state();
        let home = machine.config().home;
        if machine.trial_number() != self.trial_seen {
            self.trial_seen = machine.trial_number();
            self.lapsing = self.rng.random_bool(self.lapse_rate);
        }

        let workspace = runner.workspace();
        let goal = if state == TrialState::HoldB && self.lapsing {
            home
        } else if state.in_trial() && workspace.exists(TARGET) {
            workspace.get_position(TARGET)?
        } else {
            home
        };
        let cursor = workspace.cursor_position()?;
        let next = approach(cursor, goal, self.speed * dt.as_secs_f64());
        runner.workspace_mut().set_cursor_position(next)?;
        Ok(())
    }
}

fn approach(from: Position, to: Position, max_step: f64) -> Position {
    let distance = from.distance_squared(&to).sqrt();
    if distance <= max_step || distance == 0.0 {
        return to;
    }
    let f = max_step / distance;
    Position(
        from.0 + (to.0 - from.0) * f,
        from.1 + (to.1 - from.1) * f,
        from.2 + (to.2 - from.2) * f,
    )
}

pub struct Simulation<T: Timer<Timestamp = u64>> {
    runner: TrialRunner<MemoryWorkspace, StdRng, T>,
    subject: Subject,
    tally: Rc<RefCell<Tally>>,
    tick: Duration,
}

impl<T: Timer<Timestamp = u64>> Simulation<T> {
    pub fn new(config: TaskConfig, rng: StdRng, subject: Subject, timer: T, tick: Duration) -> Self {
        let workspace = MemoryWorkspace::new(config.cursor.kind());
        let machine = TrialStateMachine::new(config, workspace, rng)
            .with_reward(|index: usize| tracing::debug!(target_index = index, "reward"));

        let tally = Rc::new(RefCell::new(Tally::default()));
        let sink = Rc::clone(&tally);
        let mut log = TracingObserver;
        let observer = move |t: &Transition| {
            log.on_transition(t);
            sink.borrow_mut().record(t);
        };
        let driver = TransitionDriver::observed(machine, observer);

        Self {
            runner: TrialRunner::new(driver, timer),
            subject,
            tally,
            tick,
        }
    }

    /// Runs one block until `trials` trials have finished.
    pub fn run(&mut self, trials: usize) -> Result<Tally> {
        self.runner
            .start_block(None)
            .context("starting block")?;

        let max_ticks = (trials as u64).saturating_mul(100_000);
        let mut ticks = 0;
        while !(self.tally.borrow().completed() >= trials
            && self.runner.driver().current_state() == TrialState::Intertrial)
        {
            if ticks >= max_ticks {
                anyhow::bail!("block did not finish after {ticks} ticks");
            }
            self.subject.step(&mut self.runner, self.tick)?;
            self.runner.update().context("applying trial events")?;
            self.runner.timer().sleep(self.tick);
            ticks += 1;
        }

        self.runner.end_block().context("ending block")?;
        let tally = self.tally.borrow().clone();
        Ok(tally)
    }
}
