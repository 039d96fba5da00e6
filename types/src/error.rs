//! Errors raised while constructing fundamental types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("quorum percentage must be within 1..=100, got {0}")]
    InvalidQuorum(u32),

    #[error("voting period must be greater than zero")]
    InvalidVotingPeriod,
}
