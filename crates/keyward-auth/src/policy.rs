//! Declarative rank requirements for privileged lifecycle operations.
//!
//! The policy names the minimum rank per operation in one place instead of
//! comparing against a magic tier at each call site. Claim and authenticate
//! carry no entry here: possession of the license key is their only
//! credential.

use keyward_core::Rank;
use serde::{Deserialize, Serialize};

/// Minimum ranks for the privileged lifecycle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankPolicy {
    /// Minimum rank to issue a new license.
    pub create: Rank,

    /// Minimum rank to suspend a license.
    pub suspend: Rank,

    /// Minimum rank to delete a license.
    pub delete: Rank,
}

impl Default for RankPolicy {
    fn default() -> Self {
        Self {
            create: Rank::Admin,
            suspend: Rank::Admin,
            delete: Rank::Admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_requires_admin() {
        let policy = RankPolicy::default();
        assert_eq!(policy.create, Rank::Admin);
        assert_eq!(policy.suspend, Rank::Admin);
        assert_eq!(policy.delete, Rank::Admin);
    }
}
