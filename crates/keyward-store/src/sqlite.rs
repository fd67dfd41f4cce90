//! SQLite implementation of the store traits.
//!
//! This is the primary storage backend for Keyward. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::net::IpAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use keyward_core::{Identity, LicenseKey, LicenseRecord, OwnerId, Rank, SessionToken};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{IdentityStore, LicenseStore};

/// How long a statement may wait on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking to
/// avoid blocking the async runtime. The busy timeout bounds every
/// statement, so no caller hangs on a contended database.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a statement on the connection inside `spawn_blocking`.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| StoreError::Background(format!("connection mutex poisoned: {e}")))?;
            f(&*guard)
        })
        .await
        .map_err(|e| StoreError::Background(format!("blocking task failed: {e}")))?
    }
}

/// A license row exactly as SQLite hands it back.
struct RawLicense {
    key: String,
    owner: Option<String>,
    created: i64,
    duration_days: i64,
    expiry: Option<i64>,
    bound_addr: Option<String>,
    suspended: i64,
}

impl RawLicense {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get("license_key")?,
            owner: row.get("owner")?,
            created: row.get("created")?,
            duration_days: row.get("duration_days")?,
            expiry: row.get("expiry")?,
            bound_addr: row.get("bound_addr")?,
            suspended: row.get("suspended")?,
        })
    }

    fn into_record(self) -> Result<LicenseRecord> {
        let key = LicenseKey::parse(self.key)
            .map_err(|e| StoreError::InvalidData(format!("license_key: {e}")))?;
        let duration_days = u32::try_from(self.duration_days)
            .map_err(|_| StoreError::InvalidData(format!("duration_days: {}", self.duration_days)))?;
        let bound_addr = self
            .bound_addr
            .map(|s| {
                s.parse::<IpAddr>()
                    .map_err(|e| StoreError::InvalidData(format!("bound_addr: {e}")))
            })
            .transpose()?;

        Ok(LicenseRecord {
            key,
            owner: self.owner.map(OwnerId::new),
            created: self.created,
            duration_days,
            expiry: self.expiry,
            bound_addr,
            suspended: self.suspended != 0,
        })
    }
}

/// Map constraint violations to `Duplicate`, everything else to `Database`.
fn insert_error(e: rusqlite::Error, what: String) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Duplicate(what)
        }
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl LicenseStore for SqliteStore {
    async fn find_license(&self, key: &LicenseKey) -> Result<Option<LicenseRecord>> {
        let key = key.as_str().to_owned();

        self.blocking(move |conn| {
            let raw = conn
                .query_row(
                    "SELECT license_key, owner, created, duration_days, expiry, bound_addr, suspended
                     FROM licenses WHERE license_key = ?1",
                    params![key],
                    RawLicense::read,
                )
                .optional()?;

            raw.map(RawLicense::into_record).transpose()
        })
        .await
    }

    async fn insert_license(&self, record: &LicenseRecord) -> Result<()> {
        let record = record.clone();

        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO licenses (
                    license_key, owner, created, duration_days, expiry, bound_addr, suspended
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.key.as_str(),
                    record.owner.as_ref().map(|o| o.as_str()),
                    record.created,
                    i64::from(record.duration_days),
                    record.expiry,
                    record.bound_addr.map(|a| a.to_string()),
                    record.suspended as i64,
                ],
            )
            .map_err(|e| insert_error(e, format!("license {}", record.key)))?;

            Ok(())
        })
        .await
    }

    async fn set_owner_if_unclaimed(&self, key: &LicenseKey, owner: &OwnerId) -> Result<bool> {
        let key = key.as_str().to_owned();
        let owner = owner.as_str().to_owned();

        self.blocking(move |conn| {
            let affected = conn.execute(
                "UPDATE licenses SET owner = ?2 WHERE license_key = ?1 AND owner IS NULL",
                params![key, owner],
            )?;
            Ok(affected > 0)
        })
        .await
    }

    async fn set_activation_if_unset(
        &self,
        key: &LicenseKey,
        expiry: i64,
        addr: IpAddr,
    ) -> Result<bool> {
        let key = key.as_str().to_owned();
        let addr = addr.to_string();

        self.blocking(move |conn| {
            let affected = conn.execute(
                "UPDATE licenses SET expiry = ?2, bound_addr = ?3
                 WHERE license_key = ?1 AND expiry IS NULL",
                params![key, expiry, addr],
            )?;
            Ok(affected > 0)
        })
        .await
    }

    async fn set_suspended(&self, key: &LicenseKey, suspended: bool) -> Result<bool> {
        let key = key.as_str().to_owned();

        self.blocking(move |conn| {
            let affected = conn.execute(
                "UPDATE licenses SET suspended = ?2 WHERE license_key = ?1",
                params![key, suspended as i64],
            )?;
            Ok(affected > 0)
        })
        .await
    }

    async fn delete_license(&self, key: &LicenseKey) -> Result<bool> {
        let key = key.as_str().to_owned();

        self.blocking(move |conn| {
            let affected = conn.execute(
                "DELETE FROM licenses WHERE license_key = ?1",
                params![key],
            )?;
            Ok(affected > 0)
        })
        .await
    }

    async fn count_licenses(&self) -> Result<u64> {
        self.blocking(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM licenses", [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    async fn key_exists(&self, key: &LicenseKey) -> Result<bool> {
        let key = key.as_str().to_owned();

        self.blocking(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM licenses WHERE license_key = ?1)",
                params![key],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }
}

#[async_trait]
impl IdentityStore for SqliteStore {
    async fn resolve_rank(&self, token: &SessionToken) -> Result<Option<Rank>> {
        let token = token.as_str().to_owned();

        self.blocking(move |conn| {
            let tier: Option<i64> = conn
                .query_row(
                    "SELECT rank FROM identities WHERE token = ?1",
                    params![token],
                    |row| row.get(0),
                )
                .optional()?;

            tier.map(|t| {
                Rank::from_tier(t).ok_or_else(|| StoreError::InvalidData(format!("rank tier: {t}")))
            })
            .transpose()
        })
        .await
    }

    async fn insert_identity(&self, identity: &Identity) -> Result<()> {
        let identity = identity.clone();

        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO identities (token, username, rank, created) VALUES (?1, ?2, ?3, ?4)",
                params![
                    identity.token.as_str(),
                    identity.username,
                    identity.rank.tier(),
                    identity.created,
                ],
            )
            .map_err(|e| insert_error(e, format!("identity {}", identity.username)))?;

            Ok(())
        })
        .await
    }
}
