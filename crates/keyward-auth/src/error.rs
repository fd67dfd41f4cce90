//! Error types for the authorization gate.

use keyward_core::Rank;
use keyward_store::StoreError;
use thiserror::Error;

/// Errors that can occur while authorizing a caller.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The presented session token is unknown to the identity store.
    #[error("invalid token")]
    InvalidToken,

    /// The caller's rank is below the required minimum.
    #[error("unauthorized: requires {required}, caller is {actual}")]
    InsufficientRank { required: Rank, actual: Rank },

    /// Identity lookup failed at the storage layer.
    #[error("identity store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthError>;
