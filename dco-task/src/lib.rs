pub mod config;
pub mod driver;
pub mod machine;
pub mod runner;
pub mod schedule;
pub mod targets;
pub mod workspace;

pub use config::{SphereStyle, TaskConfig, TimeoutConfig};
pub use driver::{NoopObserver, TracingObserver, TransitionDriver, TransitionObserver};
pub use machine::{RewardSink, TrialStateMachine};
pub use runner::TrialRunner;
pub use schedule::TimeoutSchedule;
pub use targets::{SelectionPolicy, TargetParameterSet, default_targets};
pub use workspace::{MemoryWorkspace, WorkspaceAdapter, WorkspaceObject};
