use crate::config::TimeoutConfig;
use dco_core::TrialState;

/// Deadline of the `timeout` event for the current state, in clock ns
#[derive(Debug, Clone)]
pub struct TimeoutSchedule {
    timeouts: TimeoutConfig,
    armed_for: Option<TrialState>,
    deadline_ns: Option<u64>,
}

impl TimeoutSchedule {
    pub fn new(timeouts: TimeoutConfig) -> Self {
        Self {
            timeouts,
            armed_for: None,
            deadline_ns: None,
        }
    }

    /// Starts the countdown for `state`; states without a timeout disarm.
    pub fn arm(&mut self, state: TrialState, now_ns: u64) {
        self.armed_for = Some(state);
        self.deadline_ns = self
            .timeouts
            .for_state(state)
            .map(|d| {
                let ns = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
                now_ns.saturating_add(ns)
            });
    }

    pub fn disarm(&mut self) {
        self.armed_for = None;
        self.deadline_ns = None;
    }

    pub fn armed_for(&self) -> Option<TrialState> {
        self.armed_for
    }

    pub fn deadline_ns(&self) -> Option<u64> {
        self.deadline_ns
    }

    pub fn expired(&self, now_ns: u64) -> bool {
        self.deadline_ns.is_some_and(|deadline| now_ns >= deadline)
    }
}
