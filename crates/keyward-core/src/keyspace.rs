//! The key alphabet and uniform random sampling.
//!
//! License keys and session tokens are opaque strings drawn uniformly from
//! a fixed 64-symbol alphabet. Uniqueness against the store is the
//! generator's job in the engine crate; this module is pure sampling.

use rand::Rng;

use crate::types::{LicenseKey, SessionToken};

/// The fixed key alphabet: `A-Z`, `a-z`, `0-9`, and `.`.
pub const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789.";

/// Sample a license key of `length` characters uniformly from the alphabet.
pub fn sample_key(length: usize) -> LicenseKey {
    LicenseKey::new_unchecked(sample_string(length))
}

/// Sample a session token of `length` characters uniformly from the alphabet.
pub fn sample_token(length: usize) -> SessionToken {
    SessionToken::new(sample_string(length))
}

/// The number of distinct keys of the given length, saturating at `u128::MAX`.
pub fn keyspace_size(length: usize) -> u128 {
    let base = KEY_ALPHABET.len() as u128;
    u32::try_from(length)
        .ok()
        .and_then(|exp| base.checked_pow(exp))
        .unwrap_or(u128::MAX)
}

fn sample_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
        .collect()
}
