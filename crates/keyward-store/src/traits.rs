//! Store traits: the abstract interfaces for license and identity persistence.
//!
//! These traits keep the lifecycle engine storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use std::net::IpAddr;

use async_trait::async_trait;
use keyward_core::{Identity, LicenseKey, LicenseRecord, OwnerId, Rank, SessionToken};

use crate::error::Result;

/// Async interface for license persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, statements run under `spawn_blocking` to avoid blocking the
/// runtime.
///
/// # Design Notes
///
/// - **Conditional transitions**: `set_owner_if_unclaimed` and
///   `set_activation_if_unset` are atomic read-modify-write statements.
///   Under concurrent calls exactly one returns `true`; losers must re-read
///   the record before evaluating anything.
/// - **Idempotent flags**: `set_suspended` reports `true` whenever the row
///   exists, whether or not the value changed.
#[async_trait]
pub trait LicenseStore: Send + Sync {
    /// Load a license by key. `None` if no such key is stored.
    async fn find_license(&self, key: &LicenseKey) -> Result<Option<LicenseRecord>>;

    /// Insert a new license record.
    ///
    /// Fails if a record with the same key already exists.
    async fn insert_license(&self, record: &LicenseRecord) -> Result<()>;

    /// Set the owner if and only if the license is unclaimed.
    ///
    /// Returns whether a row was updated: `false` means the license is
    /// missing or already claimed.
    async fn set_owner_if_unclaimed(&self, key: &LicenseKey, owner: &OwnerId) -> Result<bool>;

    /// Bind expiry and address if and only if the license is unactivated.
    ///
    /// The two fields move together, exactly once. Returns whether a row
    /// was updated.
    async fn set_activation_if_unset(
        &self,
        key: &LicenseKey,
        expiry: i64,
        addr: IpAddr,
    ) -> Result<bool>;

    /// Set the suspension flag. Returns whether the row exists.
    async fn set_suspended(&self, key: &LicenseKey, suspended: bool) -> Result<bool>;

    /// Remove a license permanently. Returns whether a row was deleted.
    async fn delete_license(&self, key: &LicenseKey) -> Result<bool>;

    /// Total number of stored licenses.
    async fn count_licenses(&self) -> Result<u64>;

    /// Whether a license with this key is currently stored.
    async fn key_exists(&self, key: &LicenseKey) -> Result<bool>;
}

/// Async interface for resolving caller identities.
///
/// The lifecycle engine only reads ranks; identity mutation beyond
/// provisioning lives with the external user system.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Resolve a session token to the holder's rank.
    ///
    /// `None` when the token is unknown.
    async fn resolve_rank(&self, token: &SessionToken) -> Result<Option<Rank>>;

    /// Provision an identity.
    ///
    /// Fails if the token is already in use.
    async fn insert_identity(&self, identity: &Identity) -> Result<()>;
}
