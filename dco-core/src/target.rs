use crate::error::TaskError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workspace object names used by the task
pub const CURSOR: &str = "cursor";
pub const TARGET: &str = "target";
pub const CUE: &str = "cue";

/// RGBA, each channel in `0.0..=1.0`
pub type Rgba = [f32; 4];

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position(pub f64, pub f64, pub f64);

impl Position {
    pub const ORIGIN: Position = Position(0.0, 0.0, 0.0);

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(x, y, z)
    }

    pub fn distance_squared(&self, other: &Position) -> f64 {
        let (dx, dy, dz) = (self.0 - other.0, self.1 - other.1, self.2 - other.2);
        dx * dx + dy * dy + dz * dz
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite() && self.1.is_finite() && self.2.is_finite()
    }
}

impl From<(f64, f64, f64)> for Position {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self(x, y, z)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.0, self.1, self.2)
    }
}

/// Engagement volume of a workspace object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetShape {
    Sphere { radius: f64 },
    Cuboid { width: f64, height: f64, depth: f64 },
}

impl TargetShape {
    fn is_valid(&self) -> bool {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        match *self {
            TargetShape::Sphere { radius } => positive(radius),
            TargetShape::Cuboid {
                width,
                height,
                depth,
            } => positive(width) && positive(height) && positive(depth),
        }
    }
}

/// Appearance handed to the workspace when an object is spawned
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectKind {
    pub shape: TargetShape,
    pub color: Rgba,
}

impl ObjectKind {
    pub fn sphere(radius: f64, color: Rgba) -> Self {
        Self {
            shape: TargetShape::Sphere { radius },
            color,
        }
    }
}

/// One candidate outer target of a block.
///
/// `shape` and `color` are optional; when absent the configured target
/// appearance is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetParameter {
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<TargetShape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
}

impl TargetParameter {
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Position(x, y, z),
            shape: None,
            color: None,
        }
    }

    /// Appearance of this target, falling back to `default` per field
    pub fn kind_or(&self, default: &ObjectKind) -> ObjectKind {
        ObjectKind {
            shape: self.shape.unwrap_or(default.shape),
            color: self.color.unwrap_or(default.color),
        }
    }

    pub fn validate(&self) -> Result<(), TaskError> {
        if !self.position.is_finite() {
            return Err(TaskError::InvalidConfiguration(format!(
                "target position {} is not finite",
                self.position
            )));
        }
        if let Some(shape) = &self.shape {
            if !shape.is_valid() {
                return Err(TaskError::InvalidConfiguration(format!(
                    "target at {} has a degenerate shape {:?}",
                    self.position, shape
                )));
            }
        }
        if let Some(color) = &self.color {
            if color.iter().any(|c| !(0.0..=1.0).contains(c)) {
                return Err(TaskError::InvalidConfiguration(format!(
                    "target at {} has color channels outside 0..=1",
                    self.position
                )));
            }
        }
        Ok(())
    }
}
