//! # Keyward
//!
//! The unified API for Keyward - software license credentials bound to a
//! single network address.
//!
//! ## Overview
//!
//! Keyward issues opaque license keys, lets holders claim them, binds each
//! license to the first network address that authenticates with it, and
//! checks every later request against that binding.
//!
//! ## Key Concepts
//!
//! - **License**: A credential record identified by an opaque key.
//! - **Claim**: One-way assignment of an owner to an unclaimed license.
//! - **Activation**: Lazy first-use binding of address and expiry. A
//!   claimed-but-never-used license consumes no wall-clock duration.
//! - **Suspension**: An administrative flag that forces authentication to
//!   fail regardless of expiry and address.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keyward::{Engine, EngineConfig};
//! use keyward::core::SessionToken;
//! use keyward::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("licenses.db").unwrap();
//!     let engine = Engine::new(store, EngineConfig::default());
//!
//!     let admin = SessionToken::new("admin-session-token");
//!     let key = engine.create(30, &admin).await.unwrap();
//!
//!     // Hand `key` to a customer; they claim and then authenticate:
//!     // engine.claim(&key, &OwnerId::new("user42")).await.unwrap();
//!     // let decision = engine.authenticate(&key, "1.2.3.4".parse().unwrap()).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `keyward::core` - Core primitives (LicenseRecord, Rank, etc.)
//! - `keyward::store` - Storage abstraction, SQLite and memory backends
//! - `keyward::auth` - Authorization gate and rank policy

pub mod engine;
pub mod error;
pub mod keygen;

// Re-export component crates
pub use keyward_auth as auth;
pub use keyward_core as core;
pub use keyward_store as store;

// Re-export main types for convenience
pub use engine::{Engine, EngineConfig};
pub use error::{EngineError, Result};
pub use keygen::KeyGenerator;

// Re-export commonly used core types
pub use keyward_core::{
    AuthDecision, Identity, LicenseKey, LicenseRecord, OwnerId, Rank, RejectReason, SessionToken,
};
pub use keyward_auth::RankPolicy;
