//! The Engine: the license lifecycle state machine.
//!
//! The Engine brings together storage, key generation, and the
//! authorization gate into a cohesive interface for a request-handling
//! layer. It holds no in-process state beyond the store handle, so a single
//! instance is safe to share across concurrent request handlers; every
//! operation reads and writes through the store, which is the single source
//! of truth.

use std::net::IpAddr;
use std::sync::Arc;

use keyward_auth::{require_rank, RankPolicy};
use keyward_core::{AuthDecision, LicenseKey, LicenseRecord, OwnerId, RejectReason, SessionToken};
use keyward_store::{IdentityStore, LicenseStore};

use crate::error::{EngineError, Result};
use crate::keygen::{KeyGenerator, DEFAULT_KEY_LENGTH, DEFAULT_MAX_ATTEMPTS};

/// Configuration for the Engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Characters per generated license key.
    pub key_length: usize,
    /// Collision-retry budget for key generation.
    pub max_key_attempts: usize,
    /// Minimum ranks for the privileged operations.
    pub policy: RankPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_length: DEFAULT_KEY_LENGTH,
            max_key_attempts: DEFAULT_MAX_ATTEMPTS,
            policy: RankPolicy::default(),
        }
    }
}

/// The main Engine struct.
///
/// Provides the upward interface for:
/// - Issuing licenses (privileged)
/// - Claiming a license by key
/// - Authenticating a key + address pair, activating on first use
/// - Suspending and deleting licenses (privileged)
/// - Inspection: record projection, active check, total count
///
/// Privileged operations run the authorization gate before touching any
/// license state, so a denied caller cannot probe which keys exist.
pub struct Engine<S> {
    /// The storage backend.
    store: Arc<S>,
    /// Key generator configured from [`EngineConfig`].
    keygen: KeyGenerator,
    /// Rank policy for privileged operations.
    policy: RankPolicy,
}

impl<S> Engine<S>
where
    S: LicenseStore + IdentityStore,
{
    /// Create a new engine instance.
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            store: Arc::new(store),
            keygen: KeyGenerator::new(config.key_length, config.max_key_attempts),
            policy: config.policy,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Privileged Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue a new license valid for `duration_days` after first activation.
    ///
    /// Returns the freshly generated key. The caller must hold the
    /// `policy.create` rank.
    pub async fn create(&self, duration_days: u32, token: &SessionToken) -> Result<LicenseKey> {
        require_rank(&*self.store, token, self.policy.create).await?;

        let key = self.keygen.generate_unique(&*self.store).await?;
        let record = LicenseRecord::new(key.clone(), duration_days, now_millis());
        self.store
            .insert_license(&record)
            .await
            .map_err(EngineError::internal)?;

        tracing::debug!(key = %key, duration_days, "license created");
        Ok(key)
    }

    /// Suspend a license. Idempotent.
    pub async fn suspend(&self, key: &LicenseKey, token: &SessionToken) -> Result<()> {
        require_rank(&*self.store, token, self.policy.suspend).await?;

        let affected = self
            .store
            .set_suspended(key, true)
            .await
            .map_err(EngineError::internal)?;
        if !affected {
            return Err(EngineError::NotFound);
        }

        tracing::debug!(key = %key, "license suspended");
        Ok(())
    }

    /// Delete a license permanently. Irreversible.
    pub async fn delete(&self, key: &LicenseKey, token: &SessionToken) -> Result<()> {
        require_rank(&*self.store, token, self.policy.delete).await?;

        let affected = self
            .store
            .delete_license(key)
            .await
            .map_err(EngineError::internal)?;
        if !affected {
            return Err(EngineError::NotFound);
        }

        tracing::debug!(key = %key, "license deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Key-holder Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Claim an unclaimed license for `owner`.
    ///
    /// One-way: the owner is set exactly once. Possession of the key is the
    /// only credential; there is deliberately no rank check here.
    pub async fn claim(&self, key: &LicenseKey, owner: &OwnerId) -> Result<()> {
        let record = self
            .store
            .find_license(key)
            .await
            .map_err(EngineError::internal)?
            .ok_or(EngineError::NotFound)?;

        if record.is_claimed() {
            return Err(EngineError::AlreadyClaimed);
        }

        // The store decides the winner under concurrent claims; a loser of
        // the race lands here with zero rows affected.
        let applied = self
            .store
            .set_owner_if_unclaimed(key, owner)
            .await
            .map_err(EngineError::internal)?;
        if !applied {
            return Err(EngineError::AlreadyClaimed);
        }

        tracing::debug!(key = %key, owner = %owner, "license claimed");
        Ok(())
    }

    /// Authenticate a request presenting `key` from `addr`.
    ///
    /// Never errors for unknown keys; the decision carries the reason. The
    /// first successful call after a claim performs the activation
    /// transition, binding `addr` and computing the expiry.
    pub async fn authenticate(&self, key: &LicenseKey, addr: IpAddr) -> Result<AuthDecision> {
        let Some(record) = self
            .store
            .find_license(key)
            .await
            .map_err(EngineError::internal)?
        else {
            return Ok(AuthDecision::Rejected(RejectReason::UnknownKey));
        };

        if !record.is_claimed() {
            return Ok(AuthDecision::Rejected(RejectReason::Unclaimed));
        }

        let record = if record.is_activated() {
            record
        } else {
            match self.activate_if_first_use(&record, addr).await? {
                Some(record) => record,
                // Deleted between the read and the activation write.
                None => return Ok(AuthDecision::Rejected(RejectReason::UnknownKey)),
            }
        };

        Ok(record.evaluate(addr, now_millis()))
    }

    /// The Claimed -> Activated transition, separate from the validity
    /// predicate.
    ///
    /// Exactly one concurrent caller wins the conditional write; winner and
    /// loser alike re-read the record so validity is always evaluated
    /// against the persisted binding, never a locally computed one.
    async fn activate_if_first_use(
        &self,
        record: &LicenseRecord,
        addr: IpAddr,
    ) -> Result<Option<LicenseRecord>> {
        let expiry = record.expiry_from(now_millis());
        let won = self
            .store
            .set_activation_if_unset(&record.key, expiry, addr)
            .await
            .map_err(EngineError::internal)?;
        if won {
            tracing::debug!(key = %record.key, expiry, "license activated");
        }

        self.store
            .find_license(&record.key)
            .await
            .map_err(EngineError::internal)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inspection Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Read-only projection of a license record.
    pub async fn info(&self, key: &LicenseKey) -> Result<LicenseRecord> {
        self.store
            .find_license(key)
            .await
            .map_err(EngineError::internal)?
            .ok_or(EngineError::NotFound)
    }

    /// Whether the license is active: claimed, activated, unexpired, not
    /// suspended.
    pub async fn is_active(&self, key: &LicenseKey) -> Result<bool> {
        let record = self.info(key).await?;
        Ok(record.is_active(now_millis()))
    }

    /// Total number of stored licenses.
    pub async fn count(&self) -> Result<u64> {
        self.store
            .count_licenses()
            .await
            .map_err(EngineError::internal)
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

#[cfg(test)]
mod tests {
    use super::*;
    use keyward_core::{Identity, Rank, MILLIS_PER_DAY};
    use keyward_store::MemoryStore;

    const ADMIN: &str = "admin-token";
    const MEMBER: &str = "member-token";

    fn addr(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn token(s: &str) -> SessionToken {
        SessionToken::new(s)
    }

    async fn engine() -> Engine<MemoryStore> {
        let store = MemoryStore::new();
        store
            .insert_identity(&Identity::new(token(ADMIN), "root", Rank::Admin, 0))
            .await
            .unwrap();
        store
            .insert_identity(&Identity::new(token(MEMBER), "alice", Rank::Member, 0))
            .await
            .unwrap();
        Engine::new(store, EngineConfig::default())
    }

    async fn claimed_key(engine: &Engine<MemoryStore>) -> LicenseKey {
        let key = engine.create(30, &token(ADMIN)).await.unwrap();
        engine.claim(&key, &OwnerId::new("user42")).await.unwrap();
        key
    }

    #[tokio::test]
    async fn test_create_inserts_unclaimed_record() {
        let engine = engine().await;
        let key = engine.create(30, &token(ADMIN)).await.unwrap();

        assert_eq!(key.len(), DEFAULT_KEY_LENGTH);
        let record = engine.info(&key).await.unwrap();
        assert_eq!(record.owner, None);
        assert_eq!(record.expiry, None);
        assert_eq!(record.bound_addr, None);
        assert_eq!(record.duration_days, 30);
        assert!(!record.suspended);
    }

    #[tokio::test]
    async fn test_create_denied_leaves_store_unchanged() {
        let engine = engine().await;

        let err = engine.create(30, &token(MEMBER)).await.unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized { .. }));

        let err = engine.create(30, &token("ghost")).await.unwrap_err();
        assert_eq!(err, EngineError::InvalidToken);

        assert_eq!(engine.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_gate_runs_before_existence() {
        let engine = engine().await;
        let missing = LicenseKey::parse("doesnotexist1234").unwrap();

        // A low-rank caller probing a nonexistent key must see Unauthorized,
        // not NotFound.
        assert!(matches!(
            engine.suspend(&missing, &token(MEMBER)).await.unwrap_err(),
            EngineError::Unauthorized { .. }
        ));
        assert!(matches!(
            engine.delete(&missing, &token(MEMBER)).await.unwrap_err(),
            EngineError::Unauthorized { .. }
        ));

        // An authorized caller then gets the honest answer.
        assert_eq!(
            engine.suspend(&missing, &token(ADMIN)).await.unwrap_err(),
            EngineError::NotFound
        );
        assert_eq!(
            engine.delete(&missing, &token(ADMIN)).await.unwrap_err(),
            EngineError::NotFound
        );
    }

    #[tokio::test]
    async fn test_claim_once_only() {
        let engine = engine().await;
        let key = engine.create(30, &token(ADMIN)).await.unwrap();

        engine.claim(&key, &OwnerId::new("o1")).await.unwrap();
        let err = engine.claim(&key, &OwnerId::new("o2")).await.unwrap_err();
        assert_eq!(err, EngineError::AlreadyClaimed);

        let record = engine.info(&key).await.unwrap();
        assert_eq!(record.owner, Some(OwnerId::new("o1")));
    }

    #[tokio::test]
    async fn test_claim_unknown_key() {
        let engine = engine().await;
        let missing = LicenseKey::parse("doesnotexist1234").unwrap();
        assert_eq!(
            engine.claim(&missing, &OwnerId::new("o1")).await.unwrap_err(),
            EngineError::NotFound
        );
    }

    #[tokio::test]
    async fn test_authenticate_unknown_key() {
        let engine = engine().await;
        let missing = LicenseKey::parse("doesnotexist1234").unwrap();
        let decision = engine.authenticate(&missing, addr("1.2.3.4")).await.unwrap();
        assert_eq!(decision, AuthDecision::Rejected(RejectReason::UnknownKey));
    }

    #[tokio::test]
    async fn test_authenticate_before_claim() {
        let engine = engine().await;
        let key = engine.create(30, &token(ADMIN)).await.unwrap();

        let decision = engine.authenticate(&key, addr("1.2.3.4")).await.unwrap();
        assert_eq!(decision, AuthDecision::Rejected(RejectReason::Unclaimed));

        // Activation must not have happened.
        let record = engine.info(&key).await.unwrap();
        assert_eq!(record.expiry, None);
        assert_eq!(record.bound_addr, None);
    }

    #[tokio::test]
    async fn test_first_authenticate_activates() {
        let engine = engine().await;
        let key = claimed_key(&engine).await;

        let before = now_millis();
        let decision = engine.authenticate(&key, addr("1.2.3.4")).await.unwrap();
        let after = now_millis();
        assert!(decision.is_valid());

        let record = engine.info(&key).await.unwrap();
        assert_eq!(record.bound_addr, Some(addr("1.2.3.4")));
        let expiry = record.expiry.unwrap();
        assert!(expiry >= before + 30 * MILLIS_PER_DAY);
        assert!(expiry <= after + 30 * MILLIS_PER_DAY);
    }

    #[tokio::test]
    async fn test_wrong_address_rejected_without_mutation() {
        let engine = engine().await;
        let key = claimed_key(&engine).await;

        engine.authenticate(&key, addr("1.2.3.4")).await.unwrap();
        let bound = engine.info(&key).await.unwrap();

        let decision = engine.authenticate(&key, addr("5.6.7.8")).await.unwrap();
        assert_eq!(
            decision,
            AuthDecision::Rejected(RejectReason::AddressMismatch)
        );

        // The failed attempt does not touch the binding.
        let record = engine.info(&key).await.unwrap();
        assert_eq!(record.expiry, bound.expiry);
        assert_eq!(record.bound_addr, bound.bound_addr);
    }

    #[tokio::test]
    async fn test_elapsed_expiry_rejected() {
        let engine = engine().await;
        let key = claimed_key(&engine).await;
        engine.authenticate(&key, addr("1.2.3.4")).await.unwrap();

        // Force the expiry into the past, bypassing the engine.
        let mut record = engine.info(&key).await.unwrap();
        record.expiry = Some(now_millis() - 1);
        engine.store().delete_license(&key).await.unwrap();
        engine.store().insert_license(&record).await.unwrap();

        let decision = engine.authenticate(&key, addr("1.2.3.4")).await.unwrap();
        assert_eq!(decision, AuthDecision::Rejected(RejectReason::Expired));
        assert!(!engine.is_active(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_suspend_forces_rejection() {
        let engine = engine().await;
        let key = claimed_key(&engine).await;
        assert!(engine
            .authenticate(&key, addr("1.2.3.4"))
            .await
            .unwrap()
            .is_valid());

        engine.suspend(&key, &token(ADMIN)).await.unwrap();
        // Idempotent.
        engine.suspend(&key, &token(ADMIN)).await.unwrap();

        let decision = engine.authenticate(&key, addr("1.2.3.4")).await.unwrap();
        assert_eq!(decision, AuthDecision::Rejected(RejectReason::Suspended));
        assert!(!engine.is_active(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_denied_suspend_leaves_state_unchanged() {
        let engine = engine().await;
        let key = claimed_key(&engine).await;

        assert!(matches!(
            engine.suspend(&key, &token(MEMBER)).await.unwrap_err(),
            EngineError::Unauthorized { .. }
        ));
        assert!(!engine.info(&key).await.unwrap().suspended);

        assert!(matches!(
            engine.delete(&key, &token(MEMBER)).await.unwrap_err(),
            EngineError::Unauthorized { .. }
        ));
        assert!(engine.store().key_exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_then_everything_not_found() {
        let engine = engine().await;
        let key = claimed_key(&engine).await;

        engine.delete(&key, &token(ADMIN)).await.unwrap();

        assert_eq!(engine.info(&key).await.unwrap_err(), EngineError::NotFound);
        assert_eq!(
            engine.claim(&key, &OwnerId::new("o2")).await.unwrap_err(),
            EngineError::NotFound
        );
        assert_eq!(
            engine.suspend(&key, &token(ADMIN)).await.unwrap_err(),
            EngineError::NotFound
        );
        assert_eq!(
            engine.delete(&key, &token(ADMIN)).await.unwrap_err(),
            EngineError::NotFound
        );
        assert_eq!(
            engine.authenticate(&key, addr("1.2.3.4")).await.unwrap(),
            AuthDecision::Rejected(RejectReason::UnknownKey)
        );
    }

    #[tokio::test]
    async fn test_is_active_through_lifecycle() {
        let engine = engine().await;
        let key = engine.create(30, &token(ADMIN)).await.unwrap();
        assert!(!engine.is_active(&key).await.unwrap());

        engine.claim(&key, &OwnerId::new("user42")).await.unwrap();
        assert!(!engine.is_active(&key).await.unwrap());

        engine.authenticate(&key, addr("1.2.3.4")).await.unwrap();
        assert!(engine.is_active(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_count() {
        let engine = engine().await;
        assert_eq!(engine.count().await.unwrap(), 0);
        let k1 = engine.create(1, &token(ADMIN)).await.unwrap();
        engine.create(1, &token(ADMIN)).await.unwrap();
        assert_eq!(engine.count().await.unwrap(), 2);
        engine.delete(&k1, &token(ADMIN)).await.unwrap();
        assert_eq!(engine.count().await.unwrap(), 1);
    }
}
