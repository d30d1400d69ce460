use thiserror::Error;

/// Errors from orchestration-level chat operations.
///
/// Ownership and lookup failures abort the request before any side effect.
/// Provider and renderer failures are not represented here: once the user
/// message is durable they are captured on the assistant message instead
/// of propagating.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("session not found")]
    NotFound,

    #[error("session belongs to another user")]
    Forbidden,

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Errors from repository operations (used by trait definitions in murmur-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}
