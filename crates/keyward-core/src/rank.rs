//! Caller permission tiers.
//!
//! The external user store persists a bare integer tier; the gate and the
//! engine only ever see this enum, and the privileged threshold for each
//! lifecycle operation is declared in one place (`RankPolicy` in the auth
//! crate) rather than compared against a magic number per call site.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// A named permission tier. Ordering follows privilege: `Member < Support < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    /// A regular account. May claim and authenticate licenses it holds.
    Member,
    /// A support account. Reserved for read-level tooling.
    Support,
    /// An administrator. May create, suspend, and delete licenses.
    Admin,
}

impl Rank {
    /// The integer tier as persisted by the user store.
    pub const fn tier(self) -> i64 {
        match self {
            Rank::Member => 1,
            Rank::Support => 2,
            Rank::Admin => 3,
        }
    }

    /// Map a stored integer tier back to a rank.
    pub const fn from_tier(tier: i64) -> Option<Self> {
        match tier {
            1 => Some(Rank::Member),
            2 => Some(Rank::Support),
            3 => Some(Rank::Admin),
            _ => None,
        }
    }

    /// Whether this rank satisfies a required minimum.
    pub fn meets(self, min: Rank) -> bool {
        self >= min
    }
}

impl TryFrom<i64> for Rank {
    type Error = CoreError;

    fn try_from(tier: i64) -> Result<Self, Self::Error> {
        Rank::from_tier(tier).ok_or(CoreError::UnknownRankTier(tier))
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rank::Member => "member",
            Rank::Support => "support",
            Rank::Admin => "admin",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_roundtrip() {
        for rank in [Rank::Member, Rank::Support, Rank::Admin] {
            assert_eq!(Rank::from_tier(rank.tier()), Some(rank));
        }
    }

    #[test]
    fn test_unknown_tier() {
        assert_eq!(Rank::from_tier(0), None);
        assert_eq!(Rank::from_tier(4), None);
        assert_eq!(Rank::try_from(7), Err(CoreError::UnknownRankTier(7)));
    }

    #[test]
    fn test_ordering_follows_privilege() {
        assert!(Rank::Admin > Rank::Support);
        assert!(Rank::Support > Rank::Member);
    }

    #[test]
    fn test_meets() {
        assert!(Rank::Admin.meets(Rank::Admin));
        assert!(Rank::Admin.meets(Rank::Member));
        assert!(!Rank::Member.meets(Rank::Admin));
        assert!(!Rank::Support.meets(Rank::Admin));
    }
}
