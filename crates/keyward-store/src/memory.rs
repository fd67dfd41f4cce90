//! In-memory implementation of the store traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite,
//! including the conditional transitions, but keeps everything in memory
//! with no persistence.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::RwLock;

use async_trait::async_trait;

use keyward_core::{Identity, LicenseKey, LicenseRecord, OwnerId, Rank, SessionToken};

use crate::error::{Result, StoreError};
use crate::traits::{IdentityStore, LicenseStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; the
/// conditional transitions run under a single write guard, so they are
/// atomic exactly like their SQL counterparts.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Licenses indexed by key.
    licenses: HashMap<LicenseKey, LicenseRecord>,

    /// Identities indexed by session token.
    identities: HashMap<SessionToken, Identity>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Background(format!("store lock poisoned: {e}")))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Background(format!("store lock poisoned: {e}")))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LicenseStore for MemoryStore {
    async fn find_license(&self, key: &LicenseKey) -> Result<Option<LicenseRecord>> {
        Ok(self.read()?.licenses.get(key).cloned())
    }

    async fn insert_license(&self, record: &LicenseRecord) -> Result<()> {
        let mut inner = self.write()?;
        if inner.licenses.contains_key(&record.key) {
            return Err(StoreError::Duplicate(format!("license {}", record.key)));
        }
        inner.licenses.insert(record.key.clone(), record.clone());
        Ok(())
    }

    async fn set_owner_if_unclaimed(&self, key: &LicenseKey, owner: &OwnerId) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.licenses.get_mut(key) {
            Some(record) if record.owner.is_none() => {
                record.owner = Some(owner.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_activation_if_unset(
        &self,
        key: &LicenseKey,
        expiry: i64,
        addr: IpAddr,
    ) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.licenses.get_mut(key) {
            Some(record) if record.expiry.is_none() => {
                record.expiry = Some(expiry);
                record.bound_addr = Some(addr);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_suspended(&self, key: &LicenseKey, suspended: bool) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.licenses.get_mut(key) {
            Some(record) => {
                record.suspended = suspended;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_license(&self, key: &LicenseKey) -> Result<bool> {
        Ok(self.write()?.licenses.remove(key).is_some())
    }

    async fn count_licenses(&self) -> Result<u64> {
        Ok(self.read()?.licenses.len() as u64)
    }

    async fn key_exists(&self, key: &LicenseKey) -> Result<bool> {
        Ok(self.read()?.licenses.contains_key(key))
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn resolve_rank(&self, token: &SessionToken) -> Result<Option<Rank>> {
        Ok(self.read()?.identities.get(token).map(|i| i.rank))
    }

    async fn insert_identity(&self, identity: &Identity) -> Result<()> {
        let mut inner = self.write()?;
        if inner.identities.contains_key(&identity.token) {
            return Err(StoreError::Duplicate(format!(
                "identity {}",
                identity.username
            )));
        }
        inner
            .identities
            .insert(identity.token.clone(), identity.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> LicenseKey {
        LicenseKey::parse(s).unwrap()
    }

    fn addr(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();
        let record = LicenseRecord::new(key("memkey12"), 7, 1_000);

        store.insert_license(&record).await.unwrap();
        let found = store.find_license(&record.key).await.unwrap().unwrap();
        assert_eq!(found, record);
        assert_eq!(store.count_licenses().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_claim_conditional() {
        let store = MemoryStore::new();
        let record = LicenseRecord::new(key("memclaim"), 7, 1_000);
        store.insert_license(&record).await.unwrap();

        assert!(store
            .set_owner_if_unclaimed(&record.key, &OwnerId::new("alice"))
            .await
            .unwrap());
        assert!(!store
            .set_owner_if_unclaimed(&record.key, &OwnerId::new("bob"))
            .await
            .unwrap());

        let found = store.find_license(&record.key).await.unwrap().unwrap();
        assert_eq!(found.owner, Some(OwnerId::new("alice")));
    }

    #[tokio::test]
    async fn test_memory_activation_conditional() {
        let store = MemoryStore::new();
        let record = LicenseRecord::new(key("memactiv"), 7, 1_000);
        store.insert_license(&record).await.unwrap();

        assert!(store
            .set_activation_if_unset(&record.key, 9_000, addr("1.2.3.4"))
            .await
            .unwrap());
        assert!(!store
            .set_activation_if_unset(&record.key, 8_000, addr("9.9.9.9"))
            .await
            .unwrap());

        let found = store.find_license(&record.key).await.unwrap().unwrap();
        assert_eq!(found.expiry, Some(9_000));
        assert_eq!(found.bound_addr, Some(addr("1.2.3.4")));
    }

    #[tokio::test]
    async fn test_memory_duplicate_insert() {
        let store = MemoryStore::new();
        let record = LicenseRecord::new(key("memdup11"), 7, 1_000);

        store.insert_license(&record).await.unwrap();
        assert!(matches!(
            store.insert_license(&record).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_identities() {
        let store = MemoryStore::new();
        let identity = Identity::new(SessionToken::new("tok"), "alice", Rank::Support, 1_000);
        store.insert_identity(&identity).await.unwrap();

        assert_eq!(
            store.resolve_rank(&SessionToken::new("tok")).await.unwrap(),
            Some(Rank::Support)
        );
        assert_eq!(
            store
                .resolve_rank(&SessionToken::new("other"))
                .await
                .unwrap(),
            None
        );
    }
}
