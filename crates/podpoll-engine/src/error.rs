use podpoll_store::StoreError;
use podpoll_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("invalid identity {identity}: {reason}")]
    InvalidIdentity { identity: String, reason: String },

    #[error("malformed collection at {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("encoding error: {0}")]
    Encode(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("type error: {0}")]
    Type(#[from] TypeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PollResult<T> = Result<T, PollError>;
