//! # Keyward Store
//!
//! Storage abstraction for Keyward. Provides trait-based interfaces for
//! license and identity persistence with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The store module abstracts persistence behind the [`LicenseStore`] and
//! [`IdentityStore`] traits, keeping the lifecycle engine storage-agnostic.
//! The primary implementation is [`SqliteStore`], with [`MemoryStore`] for
//! tests.
//!
//! ## Key Types
//!
//! - [`LicenseStore`] - Async trait for license persistence
//! - [`IdentityStore`] - Async trait for caller-rank resolution
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Design Notes
//!
//! - **Conditional writes**: The two race-sensitive transitions (claim and
//!   first activation) are single conditional `UPDATE` statements whose
//!   affected-row count decides the winner. There is no read-then-write
//!   window at this layer.
//! - **Source of truth**: Callers never cache records; every operation
//!   reads back through the store.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{IdentityStore, LicenseStore};
