pub mod error;
pub mod state;
pub mod table;
pub mod target;
pub mod trial;

pub use error::{TaskError, UnknownName, WorkspaceError};
pub use state::{TrialEvent, TrialState};
pub use table::next_state;
pub use target::{CUE, CURSOR, ObjectKind, Position, Rgba, TARGET, TargetParameter, TargetShape};
pub use trial::{Transition, TrialOutcome};
