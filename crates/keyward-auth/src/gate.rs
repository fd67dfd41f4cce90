//! The authorization gate.

use keyward_core::{Rank, SessionToken};
use keyward_store::IdentityStore;

use crate::error::{AuthError, Result};

/// Resolve `token` to a rank and require at least `min`.
///
/// Exactly one identity lookup. Returns the caller's rank on success so
/// callers can log or audit it. Denies with [`AuthError::InvalidToken`]
/// when the token is unknown and [`AuthError::InsufficientRank`] when the
/// rank is below the minimum.
pub async fn require_rank<I>(identities: &I, token: &SessionToken, min: Rank) -> Result<Rank>
where
    I: IdentityStore + ?Sized,
{
    let rank = identities
        .resolve_rank(token)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    if rank.meets(min) {
        Ok(rank)
    } else {
        Err(AuthError::InsufficientRank {
            required: min,
            actual: rank,
        })
    }
}
