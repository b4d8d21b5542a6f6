use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid vote value: {0} (expected agree, disagree or pass)")]
    InvalidVoteValue(String),

    #[error("identity must not be empty")]
    EmptyIdentity,

    #[error("invalid poll id {0:?}: must be a single non-empty path segment")]
    InvalidPollId(String),
}
