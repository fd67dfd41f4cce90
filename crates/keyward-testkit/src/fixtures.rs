//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: an engine over a memory store
//! with one admin and one member identity, and helpers that mint licenses
//! in each lifecycle state.

use std::net::IpAddr;

use keyward::{Engine, EngineConfig};
use keyward_core::{
    sample_key, sample_token, Identity, LicenseKey, LicenseRecord, OwnerId, Rank, SessionToken,
};
use keyward_store::{IdentityStore, LicenseStore, MemoryStore};

/// A test fixture with an engine, an admin token, and a member token.
pub struct TestFixture {
    pub engine: Engine<MemoryStore>,
    pub admin: SessionToken,
    pub member: SessionToken,
}

impl TestFixture {
    /// Create a fixture with random session tokens and default config.
    pub async fn new() -> Self {
        Self::with_config(EngineConfig::default()).await
    }

    /// Create a fixture with a custom engine configuration.
    pub async fn with_config(config: EngineConfig) -> Self {
        let store = MemoryStore::new();
        let admin = sample_token(32);
        let member = sample_token(32);

        store
            .insert_identity(&Identity::new(admin.clone(), "admin", Rank::Admin, now_millis()))
            .await
            .expect("seed admin identity");
        store
            .insert_identity(&Identity::new(
                member.clone(),
                "member",
                Rank::Member,
                now_millis(),
            ))
            .await
            .expect("seed member identity");

        Self {
            engine: Engine::new(store, config),
            admin,
            member,
        }
    }

    /// The underlying memory store, for direct state manipulation.
    pub fn store(&self) -> &MemoryStore {
        self.engine.store()
    }

    /// Issue an unclaimed license.
    pub async fn issue(&self, duration_days: u32) -> LicenseKey {
        self.engine
            .create(duration_days, &self.admin)
            .await
            .expect("issue license")
    }

    /// Issue and claim a license.
    pub async fn issue_claimed(&self, duration_days: u32, owner: &str) -> LicenseKey {
        let key = self.issue(duration_days).await;
        self.engine
            .claim(&key, &OwnerId::new(owner))
            .await
            .expect("claim license");
        key
    }

    /// Issue, claim, and activate a license bound to `addr`.
    pub async fn issue_activated(
        &self,
        duration_days: u32,
        owner: &str,
        addr: IpAddr,
    ) -> LicenseKey {
        let key = self.issue_claimed(duration_days, owner).await;
        let decision = self
            .engine
            .authenticate(&key, addr)
            .await
            .expect("activate license");
        assert!(decision.is_valid(), "activation rejected: {decision:?}");
        key
    }

    /// Insert an already-expired license directly, bypassing the engine.
    pub async fn issue_expired(&self, owner: &str, addr: IpAddr) -> LicenseKey {
        let key = sample_key(16);
        let mut record = LicenseRecord::new(key.clone(), 1, now_millis() - 3 * 86_400_000);
        record.owner = Some(OwnerId::new(owner));
        record.expiry = Some(now_millis() - 86_400_000);
        record.bound_addr = Some(addr);

        self.store()
            .insert_license(&record)
            .await
            .expect("insert expired license");
        key
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
