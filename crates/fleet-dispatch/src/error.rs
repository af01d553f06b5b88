use thiserror::Error;

/// Errors surfaced by template expansion and order execution (spec §7,
/// §4.7, §4.9). The API boundary maps these to status codes directly.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Repo(#[from] fleet_db::RepoError),

    #[error(transparent)]
    Transport(#[from] fleet_transport::TransportError),

    #[error(transparent)]
    Cache(#[from] fleet_cache::CacheError),

    #[error(transparent)]
    Codec(#[from] fleet_codec::DecodeError),

    #[error("template references unknown action template id {0}")]
    UnknownActionTemplate(u64),

    #[error("order {0} is already in a terminal state")]
    OrderAlreadyTerminal(String),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
