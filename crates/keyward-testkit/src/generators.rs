//! Proptest generators for property-based testing.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use proptest::prelude::*;

use keyward_core::{LicenseKey, LicenseRecord, OwnerId, Rank, SessionToken};

/// Generate a valid license key (alphabet characters, 8 to 32 long).
pub fn license_key() -> impl Strategy<Value = LicenseKey> {
    "[A-Za-z0-9.]{8,32}".prop_map(|s| LicenseKey::parse(s).expect("alphabet-valid key"))
}

/// Generate an owner identifier.
pub fn owner_id() -> impl Strategy<Value = OwnerId> {
    "[a-z][a-z0-9]{0,15}".prop_map(OwnerId::new)
}

/// Generate a session token.
pub fn session_token() -> impl Strategy<Value = SessionToken> {
    "[A-Za-z0-9.]{16,32}".prop_map(SessionToken::new)
}

/// Generate a rank.
pub fn rank() -> impl Strategy<Value = Rank> {
    prop_oneof![
        Just(Rank::Member),
        Just(Rank::Support),
        Just(Rank::Admin),
    ]
}

/// Generate an IP address, v4 or v6.
pub fn ip_addr() -> impl Strategy<Value = IpAddr> {
    prop_oneof![
        any::<[u8; 4]>().prop_map(|o| IpAddr::V4(Ipv4Addr::from(o))),
        any::<[u8; 16]>().prop_map(|o| IpAddr::V6(Ipv6Addr::from(o))),
    ]
}

/// Generate a license duration in whole days.
pub fn duration_days() -> impl Strategy<Value = u32> {
    1u32..=3650
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=i64::MAX / 2
}

/// Generate a license record in any reachable lifecycle state.
///
/// The generated record honors the structural invariants: activation fields
/// only appear on claimed records, and always together.
pub fn license_record() -> impl Strategy<Value = LicenseRecord> {
    (
        license_key(),
        duration_days(),
        timestamp(),
        proptest::option::of(owner_id()),
        proptest::option::of((timestamp(), ip_addr())),
        any::<bool>(),
    )
        .prop_map(|(key, duration, created, owner, activation, suspended)| {
            let mut record = LicenseRecord::new(key, duration, created);
            record.owner = owner;
            if record.is_claimed() {
                if let Some((expiry, addr)) = activation {
                    record.expiry = Some(expiry);
                    record.bound_addr = Some(addr);
                }
            }
            record.suspended = suspended;
            record
        })
}
