use thiserror::Error;

/// Repository-level error taxonomy (spec §4.4, §7). `fleet-api` maps these
/// to status codes; `fleet-ingest` rolls back and drops on `RepositoryError`
/// / `TransactionError`.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("duplicate entity: {0}")]
    DuplicateEntity(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("transaction error: {0}")]
    TransactionError(String),

    #[error("repository error: {0}")]
    RepositoryError(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, RepoError>;
