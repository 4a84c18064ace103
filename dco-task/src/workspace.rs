use dco_core::{CURSOR, ObjectKind, Position, TargetShape, WorkspaceError};

/// Named 3D objects the task manipulates.
///
/// Calls are synchronous; a failure is reported once and never retried by
/// the state machine.
pub trait WorkspaceAdapter {
    fn exists(&self, name: &str) -> bool;
    fn get_position(&self, name: &str) -> Result<Position, WorkspaceError>;
    /// Shape and color `name` was spawned with
    fn kind_of(&self, name: &str) -> Result<ObjectKind, WorkspaceError>;
    fn spawn(&mut self, name: &str, position: Position, kind: &ObjectKind)
        -> Result<(), WorkspaceError>;
    fn move_to(&mut self, name: &str, position: Position) -> Result<(), WorkspaceError>;
    fn remove(&mut self, name: &str) -> Result<(), WorkspaceError>;
    fn object_names(&self) -> Vec<String>;

    /// Whether the cursor currently touches the volume of `name`
    fn is_engaged(&self, name: &str) -> Result<bool, WorkspaceError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceObject {
    pub position: Position,
    pub kind: ObjectKind,
}

/// In-process workspace holding spheres and cuboids.
///
/// Starts with a `cursor` at the origin. Objects keep their spawn order.
#[derive(Debug, Clone)]
pub struct MemoryWorkspace {
    objects: Vec<(String, WorkspaceObject)>,
}

impl MemoryWorkspace {
    pub fn new(cursor: ObjectKind) -> Self {
        Self {
            objects: vec![(
                CURSOR.to_string(),
                WorkspaceObject {
                    position: Position::ORIGIN,
                    kind: cursor,
                },
            )],
        }
    }

    pub fn object(&self, name: &str) -> Option<&WorkspaceObject> {
        self.objects
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, object)| object)
    }

    fn object_mut(&mut self, name: &str) -> Result<&mut WorkspaceObject, WorkspaceError> {
        self.objects
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, object)| object)
            .ok_or_else(|| WorkspaceError::not_found(name))
    }

    pub fn set_cursor_position(&mut self, position: Position) -> Result<(), WorkspaceError> {
        self.move_to(CURSOR, position)
    }

    pub fn cursor_position(&self) -> Result<Position, WorkspaceError> {
        self.get_position(CURSOR)
    }
}

impl Default for MemoryWorkspace {
    fn default() -> Self {
        Self::new(ObjectKind::sphere(0.1, [0.0, 1.0, 0.0, 1.0]))
    }
}

impl WorkspaceAdapter for MemoryWorkspace {
    fn exists(&self, name: &str) -> bool {
        self.object(name).is_some()
    }

    fn get_position(&self, name: &str) -> Result<Position, WorkspaceError> {
        self.object(name)
            .map(|object| object.position)
            .ok_or_else(|| WorkspaceError::not_found(name))
    }

    fn kind_of(&self, name: &str) -> Result<ObjectKind, WorkspaceError> {
        self.object(name)
            .map(|object| object.kind)
            .ok_or_else(|| WorkspaceError::not_found(name))
    }

    fn spawn(
        &mut self,
        name: &str,
        position: Position,
        kind: &ObjectKind,
    ) -> Result<(), WorkspaceError> {
        if self.exists(name) {
            return Err(WorkspaceError::already_exists(name));
        }
        if !position.is_finite() {
            return Err(WorkspaceError::Rejected {
                name: name.to_string(),
                reason: format!("position {position} is not finite"),
            });
        }
        self.objects.push((
            name.to_string(),
            WorkspaceObject {
                position,
                kind: *kind,
            },
        ));
        Ok(())
    }

    fn move_to(&mut self, name: &str, position: Position) -> Result<(), WorkspaceError> {
        self.object_mut(name)?.position = position;
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), WorkspaceError> {
        let index = self
            .objects
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| WorkspaceError::not_found(name))?;
        self.objects.remove(index);
        Ok(())
    }

    fn object_names(&self) -> Vec<String> {
        self.objects.iter().map(|(n, _)| n.clone()).collect()
    }

    fn is_engaged(&self, name: &str) -> Result<bool, WorkspaceError> {
        let target = self
            .object(name)
            .ok_or_else(|| WorkspaceError::not_found(name))?;
        let cursor = self
            .object(CURSOR)
            .ok_or_else(|| WorkspaceError::not_found(CURSOR))?;
        Ok(overlaps(cursor, target))
    }
}

fn half_extents(shape: &TargetShape) -> (f64, f64, f64) {
    match *shape {
        TargetShape::Sphere { radius } => (radius, radius, radius),
        TargetShape::Cuboid {
            width,
            height,
            depth,
        } => (width / 2.0, height / 2.0, depth / 2.0),
    }
}

/// Touching counts as overlapping.
fn overlaps(a: &WorkspaceObject, b: &WorkspaceObject) -> bool {
    let (pa, pb) = (a.position, b.position);
    match (&a.kind.shape, &b.kind.shape) {
        (TargetShape::Sphere { radius: ra }, TargetShape::Sphere { radius: rb }) => {
            pa.distance_squared(&pb) <= (ra + rb) * (ra + rb)
        }
        (TargetShape::Sphere { radius }, cuboid @ TargetShape::Cuboid { .. })
        | (cuboid @ TargetShape::Cuboid { .. }, TargetShape::Sphere { radius }) => {
            let (center, box_center) = if matches!(a.kind.shape, TargetShape::Sphere { .. }) {
                (pa, pb)
            } else {
                (pb, pa)
            };
            let (hx, hy, hz) = half_extents(cuboid);
            let nearest = Position(
                center.0.clamp(box_center.0 - hx, box_center.0 + hx),
                center.1.clamp(box_center.1 - hy, box_center.1 + hy),
                center.2.clamp(box_center.2 - hz, box_center.2 + hz),
            );
            center.distance_squared(&nearest) <= radius * radius
        }
        (sa, sb) => {
            let (ax, ay, az) = half_extents(sa);
            let (bx, by, bz) = half_extents(sb);
            (pa.0 - pb.0).abs() <= ax + bx
                && (pa.1 - pb.1).abs() <= ay + by
                && (pa.2 - pb.2).abs() <= az + bz
        }
    }
}
