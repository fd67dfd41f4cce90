//! Error types for the Engine.
//!
//! This is the taxonomy the request-handling layer sees. Storage faults are
//! deliberately collapsed to [`EngineError::Internal`]: the detail is logged
//! here and never returned, so backend and schema information cannot leak
//! to clients.

use keyward_auth::AuthError;
use keyward_core::Rank;
use thiserror::Error;

/// Errors that can occur during Engine operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// No license with the given key exists.
    #[error("license not found")]
    NotFound,

    /// The license already has an owner.
    #[error("license already claimed")]
    AlreadyClaimed,

    /// The caller's rank is below the operation's minimum.
    #[error("unauthorized: requires {required}, caller is {actual}")]
    Unauthorized { required: Rank, actual: Rank },

    /// The caller's session token is unknown.
    #[error("invalid token")]
    InvalidToken,

    /// The key generator cannot produce a unique key with the configured
    /// alphabet and length.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A storage fault. Detail is logged, not returned.
    #[error("internal error")]
    Internal,
}

impl EngineError {
    /// Normalize a storage fault: log the detail, return the opaque variant.
    pub(crate) fn internal(e: impl std::fmt::Display) -> Self {
        tracing::warn!(error = %e, "storage fault normalized to internal error");
        EngineError::Internal
    }
}

impl From<AuthError> for EngineError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidToken => EngineError::InvalidToken,
            AuthError::InsufficientRank { required, actual } => {
                EngineError::Unauthorized { required, actual }
            }
            AuthError::Store(e) => EngineError::internal(e),
        }
    }
}

/// Result type for Engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
