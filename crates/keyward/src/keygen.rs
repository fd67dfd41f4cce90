//! Unique license key generation.
//!
//! Keys are sampled uniformly from the fixed alphabet and checked for
//! collisions against the store. Collisions recover transparently inside a
//! bounded retry loop; a configuration whose keyspace cannot plausibly
//! yield a fresh key surfaces `InvalidConfiguration` instead of spinning.

use keyward_core::{keyspace_size, sample_key, LicenseKey};
use keyward_store::LicenseStore;

use crate::error::{EngineError, Result};

/// Default number of characters in a generated license key.
pub const DEFAULT_KEY_LENGTH: usize = 24;

/// Default collision-retry budget per generated key.
pub const DEFAULT_MAX_ATTEMPTS: usize = 32;

/// Generates license keys that are unique among stored keys.
///
/// Uniqueness holds only against currently-stored keys: a deleted license
/// frees its key value for reissue.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    length: usize,
    max_attempts: usize,
}

impl KeyGenerator {
    pub fn new(length: usize, max_attempts: usize) -> Self {
        Self {
            length,
            max_attempts,
        }
    }

    /// The configured key length.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Sample one key, without any uniqueness check.
    pub fn generate(&self) -> LicenseKey {
        sample_key(self.length)
    }

    /// Sample keys until one is absent from the store.
    ///
    /// One `key_exists` lookup per attempt. Fails with
    /// `InvalidConfiguration` when the keyspace is exhausted or
    /// suspiciously small relative to the stored record count, or when the
    /// attempt budget runs out.
    pub async fn generate_unique<S>(&self, store: &S) -> Result<LicenseKey>
    where
        S: LicenseStore + ?Sized,
    {
        if self.length == 0 || self.max_attempts == 0 {
            return Err(EngineError::InvalidConfiguration(
                "key length and attempt budget must be nonzero".to_owned(),
            ));
        }

        // Refuse configurations where collisions stop being rare: past half
        // occupancy the retry loop degenerates into a scan.
        let stored = store.count_licenses().await.map_err(EngineError::internal)?;
        let space = keyspace_size(self.length);
        if u128::from(stored) >= space / 2 {
            return Err(EngineError::InvalidConfiguration(format!(
                "keyspace of length-{} keys is too small for {} stored licenses",
                self.length, stored
            )));
        }

        for attempt in 1..=self.max_attempts {
            let key = self.generate();
            if !store.key_exists(&key).await.map_err(EngineError::internal)? {
                if attempt > 1 {
                    tracing::debug!(attempts = attempt, "license key collision retried");
                }
                return Ok(key);
            }
        }

        Err(EngineError::InvalidConfiguration(format!(
            "no unique key of length {} after {} attempts",
            self.length, self.max_attempts
        )))
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_LENGTH, DEFAULT_MAX_ATTEMPTS)
    }
}
