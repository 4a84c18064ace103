use thiserror::Error;

/// Errors surfaced by block start and by workspace side effects.
///
/// Rejected triggers are not errors; they are reported as `Ok(false)`.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("workspace collaborator failed: {0}")]
    Collaborator(#[from] WorkspaceError),
}

/// Failures reported by a workspace adapter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkspaceError {
    #[error("object `{name}` does not exist")]
    NotFound { name: String },
    #[error("object `{name}` already exists")]
    AlreadyExists { name: String },
    #[error("workspace rejected `{name}`: {reason}")]
    Rejected { name: String, reason: String },
}

impl WorkspaceError {
    pub fn not_found(name: &str) -> Self {
        Self::NotFound {
            name: name.to_string(),
        }
    }

    pub fn already_exists(name: &str) -> Self {
        Self::AlreadyExists {
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{name}`")]
pub struct UnknownName {
    pub kind: &'static str,
    pub name: String,
}
