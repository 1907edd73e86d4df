//! Error types for the domain/interpolation/registry layer.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed submission or unknown executor name — fatal before scheduling.
    #[error("validation error: {0}")]
    Validation(String),

    /// Undeclared `depends_on` or a dependency cycle — fatal during scheduling.
    #[error("dependency error: {0}")]
    Dependency(String),

    /// `(executor, operation, action)` triple unsupported by the named adapter.
    #[error("unsupported operation '{operation}' for executor '{executor}' (action: {action})")]
    UnsupportedOperation {
        executor: String,
        operation: String,
        action: String,
    },

    /// No executor registered under this name.
    #[error("unknown executor: {0}")]
    UnknownExecutor(String),

    /// Duplicate registration under the same name at process start.
    #[error("executor already registered: {0}")]
    DuplicateExecutor(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn dependency(msg: impl Into<String>) -> Self {
        CoreError::Dependency(msg.into())
    }
}
