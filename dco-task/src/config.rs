use crate::targets::SelectionPolicy;
use dco_core::{ObjectKind, Position, Rgba, TaskError, TrialState};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Task parameters: timeouts, object appearance and target selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub timeouts: TimeoutConfig,
    pub cursor: SphereStyle,
    pub target: SphereStyle,
    /// Center target position
    pub home: Position,
    pub selection: SelectionPolicy,
    /// JSON file with the block's target records, used when `start_block`
    /// receives no explicit entries
    pub targets_path: Option<PathBuf>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            timeouts: TimeoutConfig::default(),
            cursor: SphereStyle {
                radius: 0.1,
                color: [0.0, 1.0, 0.0, 1.0],
            },
            target: SphereStyle {
                radius: 0.2,
                color: [0.0, 0.0, 1.0, 0.5],
            },
            home: Position::ORIGIN,
            selection: SelectionPolicy::default(),
            targets_path: None,
        }
    }
}

impl TaskConfig {
    pub fn from_json_str(json: &str) -> Result<Self, TaskError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| TaskError::InvalidConfiguration(format!("task config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TaskError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            TaskError::InvalidConfiguration(format!("reading {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), TaskError> {
        self.timeouts.validate()?;
        for (name, style) in [("cursor", &self.cursor), ("target", &self.target)] {
            if !(style.radius.is_finite() && style.radius > 0.0) {
                return Err(TaskError::InvalidConfiguration(format!(
                    "{name} radius must be positive, got {}",
                    style.radius
                )));
            }
        }
        if !self.home.is_finite() {
            return Err(TaskError::InvalidConfiguration(
                "home position is not finite".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereStyle {
    pub radius: f64,
    pub color: Rgba,
}

impl SphereStyle {
    pub fn kind(&self) -> ObjectKind {
        ObjectKind::sphere(self.radius, self.color)
    }
}

/// Per-state timeouts, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub intertrial: f64,
    pub move_a: f64,
    pub hold_a: f64,
    pub delay_a: f64,
    pub move_b: f64,
    pub hold_b: f64,
    pub move_c: f64,
    pub hold_c: f64,
    pub success: f64,
    pub failure: f64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            intertrial: 0.010,
            move_a: 2.000,
            hold_a: 0.500,
            delay_a: 0.500,
            move_b: 1.000,
            hold_b: 0.500,
            move_c: 1.000,
            hold_c: 0.500,
            success: 0.010,
            failure: 0.200,
        }
    }
}

impl TimeoutConfig {
    fn seconds(&self, state: TrialState) -> Option<f64> {
        use TrialState::*;
        Some(match state {
            Intertrial => self.intertrial,
            MoveA => self.move_a,
            HoldA => self.hold_a,
            DelayA => self.delay_a,
            MoveB => self.move_b,
            HoldB => self.hold_b,
            MoveC => self.move_c,
            HoldC => self.hold_c,
            Success => self.success,
            Failure => self.failure,
            Inactive | TrialSetup | TrialTeardown => return None,
        })
    }

    /// Time allowed in `state` before `timeout` is delivered
    pub fn for_state(&self, state: TrialState) -> Option<Duration> {
        self.seconds(state)
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
    }

    pub fn validate(&self) -> Result<(), TaskError> {
        for state in TrialState::ALL {
            if let Some(s) = self.seconds(state) {
                let representable = Duration::try_from_secs_f64(s)
                    .is_ok_and(|d| u64::try_from(d.as_nanos()).is_ok());
                if !representable {
                    return Err(TaskError::InvalidConfiguration(format!(
                        "timeout for {state} must be a non-negative number of seconds \
                         below {:.0}, got {s}",
                        u64::MAX as f64 / 1e9
                    )));
                }
            }
        }
        Ok(())
    }
}
