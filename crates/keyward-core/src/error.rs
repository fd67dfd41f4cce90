//! Error types for Keyward Core.

use thiserror::Error;

/// Errors that can occur constructing core values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("license key is empty")]
    EmptyKey,

    #[error("license key contains {0:?}, which is outside the key alphabet")]
    InvalidKeyCharacter(char),

    #[error("unknown rank tier: {0}")]
    UnknownRankTier(i64),
}
