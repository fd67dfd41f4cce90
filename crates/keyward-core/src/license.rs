//! The license entity and its validity predicate.
//!
//! A license is created unclaimed, claimed exactly once, and activated on
//! its first authentication after the claim. Activation binds the network
//! address and computes the expiry from the configured duration. The
//! transition writes live in the store layer; this module holds the record
//! and the pure evaluation logic, kept separate so the predicate is
//! testable without any storage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use crate::types::{LicenseKey, OwnerId};

/// Milliseconds in one whole day of license validity.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// A license record as persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Primary identifier. Immutable.
    pub key: LicenseKey,

    /// Owning identity. `None` until claimed; set exactly once.
    pub owner: Option<OwnerId>,

    /// Creation timestamp (Unix ms). Immutable.
    pub created: i64,

    /// Whole days of validity after first activation. Immutable.
    pub duration_days: u32,

    /// Expiry timestamp (Unix ms). `None` until first activation; set
    /// exactly once, together with `bound_addr`.
    pub expiry: Option<i64>,

    /// Network address bound at first activation.
    pub bound_addr: Option<IpAddr>,

    /// Administrative override. Forces authentication to fail regardless
    /// of expiry and address.
    pub suspended: bool,
}

impl LicenseRecord {
    /// A freshly issued, unclaimed license.
    pub fn new(key: LicenseKey, duration_days: u32, now: i64) -> Self {
        Self {
            key,
            owner: None,
            created: now,
            duration_days,
            expiry: None,
            bound_addr: None,
            suspended: false,
        }
    }

    /// Whether an owner has been assigned.
    pub fn is_claimed(&self) -> bool {
        self.owner.is_some()
    }

    /// Whether first-use activation has happened (expiry and address bound).
    pub fn is_activated(&self) -> bool {
        self.expiry.is_some()
    }

    /// The expiry an activation at `now` would compute.
    pub fn expiry_from(&self, now: i64) -> i64 {
        now + i64::from(self.duration_days) * MILLIS_PER_DAY
    }

    /// Whether the license is active: claimed, activated, unexpired, and
    /// not suspended.
    pub fn is_active(&self, now: i64) -> bool {
        self.is_claimed() && !self.suspended && matches!(self.expiry, Some(e) if e >= now)
    }

    /// Evaluate an authentication attempt from `addr` at time `now`.
    ///
    /// Pure: callers must have already run the first-use activation
    /// transition if it applies, and re-read the record afterwards.
    pub fn evaluate(&self, addr: IpAddr, now: i64) -> AuthDecision {
        if !self.is_claimed() {
            return AuthDecision::Rejected(RejectReason::Unclaimed);
        }
        let (Some(expiry), Some(bound)) = (self.expiry, self.bound_addr) else {
            return AuthDecision::Rejected(RejectReason::Unactivated);
        };
        if self.suspended {
            return AuthDecision::Rejected(RejectReason::Suspended);
        }
        if bound != addr {
            return AuthDecision::Rejected(RejectReason::AddressMismatch);
        }
        if expiry < now {
            return AuthDecision::Rejected(RejectReason::Expired);
        }
        AuthDecision::Granted
    }
}

/// Outcome of evaluating an authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthDecision {
    /// The presented address matches the binding and the license is active.
    Granted,
    /// Authentication failed; the reason says why.
    Rejected(RejectReason),
}

impl AuthDecision {
    /// Whether the attempt was granted.
    pub fn is_valid(&self) -> bool {
        matches!(self, AuthDecision::Granted)
    }

    /// The rejection reason, if any.
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            AuthDecision::Granted => None,
            AuthDecision::Rejected(reason) => Some(*reason),
        }
    }
}

/// Why an authentication attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// No license with the presented key exists.
    UnknownKey,
    /// The license has never been claimed.
    Unclaimed,
    /// Claimed but the first-use activation has not run.
    Unactivated,
    /// The presented address differs from the bound address.
    AddressMismatch,
    /// The expiry has elapsed.
    Expired,
    /// An administrator suspended the license.
    Suspended,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            RejectReason::UnknownKey => "unknown license key",
            RejectReason::Unclaimed => "unclaimed license",
            RejectReason::Unactivated => "license not activated",
            RejectReason::AddressMismatch => "address does not match binding",
            RejectReason::Expired => "license expired",
            RejectReason::Suspended => "license suspended",
        };
        f.write_str(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LicenseKey;

    fn addr(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn record() -> LicenseRecord {
        LicenseRecord::new(LicenseKey::parse("testkey1").unwrap(), 30, 1_000)
    }

    fn activated() -> LicenseRecord {
        let mut r = record();
        r.owner = Some(OwnerId::new("user42"));
        r.expiry = Some(1_000 + 30 * MILLIS_PER_DAY);
        r.bound_addr = Some(addr("1.2.3.4"));
        r
    }

    #[test]
    fn test_new_record_is_unclaimed() {
        let r = record();
        assert!(!r.is_claimed());
        assert!(!r.is_activated());
        assert!(!r.is_active(1_000));
    }

    #[test]
    fn test_expiry_from_duration() {
        let r = record();
        assert_eq!(r.expiry_from(5_000), 5_000 + 30 * 86_400_000);
    }

    #[test]
    fn test_evaluate_unclaimed() {
        let r = record();
        assert_eq!(
            r.evaluate(addr("1.2.3.4"), 1_000),
            AuthDecision::Rejected(RejectReason::Unclaimed)
        );
    }

    #[test]
    fn test_evaluate_claimed_but_unactivated() {
        let mut r = record();
        r.owner = Some(OwnerId::new("user42"));
        assert_eq!(
            r.evaluate(addr("1.2.3.4"), 1_000),
            AuthDecision::Rejected(RejectReason::Unactivated)
        );
    }

    #[test]
    fn test_evaluate_granted() {
        let r = activated();
        let decision = r.evaluate(addr("1.2.3.4"), 2_000);
        assert!(decision.is_valid());
        assert_eq!(decision.reason(), None);
    }

    #[test]
    fn test_evaluate_address_mismatch() {
        let r = activated();
        assert_eq!(
            r.evaluate(addr("5.6.7.8"), 2_000),
            AuthDecision::Rejected(RejectReason::AddressMismatch)
        );
    }

    #[test]
    fn test_evaluate_expired() {
        let r = activated();
        let after_expiry = r.expiry.unwrap() + 1;
        assert_eq!(
            r.evaluate(addr("1.2.3.4"), after_expiry),
            AuthDecision::Rejected(RejectReason::Expired)
        );
        // Expiry boundary is inclusive.
        assert!(r.evaluate(addr("1.2.3.4"), r.expiry.unwrap()).is_valid());
    }

    #[test]
    fn test_evaluate_suspended_overrides_everything() {
        let mut r = activated();
        r.suspended = true;
        assert_eq!(
            r.evaluate(addr("1.2.3.4"), 2_000),
            AuthDecision::Rejected(RejectReason::Suspended)
        );
        // Suspension wins even over an address mismatch.
        assert_eq!(
            r.evaluate(addr("5.6.7.8"), 2_000),
            AuthDecision::Rejected(RejectReason::Suspended)
        );
    }

    #[test]
    fn test_is_active() {
        let r = activated();
        assert!(r.is_active(2_000));
        assert!(!r.is_active(r.expiry.unwrap() + 1));

        let mut suspended = activated();
        suspended.suspended = true;
        assert!(!suspended.is_active(2_000));

        let mut unclaimed = activated();
        unclaimed.owner = None;
        assert!(!unclaimed.is_active(2_000));
    }
}
