use thiserror::Error;

/// Errors the per-message handler can hit (spec §4.5, §7). Every variant
/// is handled by logging and dropping the message — nothing here
/// propagates past a single handler invocation.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Topic(#[from] fleet_codec::TopicError),

    #[error(transparent)]
    Decode(#[from] fleet_codec::DecodeError),

    #[error(transparent)]
    Repo(#[from] fleet_db::RepoError),

    #[error(transparent)]
    Cache(#[from] fleet_cache::CacheError),
}

pub type Result<T> = std::result::Result<T, IngestError>;
