use thiserror::Error;

#[derive(Debug, Error)]
pub enum RjwError {
    #[error("not initialized: run 'rjw init'")]
    NotInitialized,

    /// A traceability reference or chain precondition was violated.
    #[error("guard violation: {0}")]
    GuardViolation(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown phase: {0}")]
    InvalidPhase(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RjwError {
    pub fn is_guard_violation(&self) -> bool {
        matches!(self, RjwError::GuardViolation(_))
    }
}

pub type Result<T> = std::result::Result<T, RjwError>;
