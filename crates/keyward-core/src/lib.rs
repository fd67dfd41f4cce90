//! # Keyward Core
//!
//! Pure primitives for Keyward: license records, caller ranks, and the key
//! alphabet.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over license state.
//!
//! ## Key Types
//!
//! - [`LicenseRecord`] - The license entity and its validity predicate
//! - [`LicenseKey`] - Opaque unique identifier drawn from a fixed alphabet
//! - [`Rank`] - Named permission tier carried by a caller identity
//! - [`AuthDecision`] - Outcome of evaluating an authentication attempt
//!
//! ## State machine
//!
//! A license moves `Unclaimed -> Claimed -> Activated`. Claiming sets the
//! owner exactly once; first authentication after a claim binds the network
//! address and computes the expiry exactly once. Suspension is an orthogonal
//! administrative flag. The transitions themselves are persisted by the
//! store layer; this crate holds the record shape and the pure predicates.

pub mod error;
pub mod keyspace;
pub mod license;
pub mod rank;
pub mod types;

pub use error::CoreError;
pub use keyspace::{keyspace_size, sample_key, sample_token, KEY_ALPHABET};
pub use license::{AuthDecision, LicenseRecord, RejectReason, MILLIS_PER_DAY};
pub use rank::Rank;
pub use types::{Identity, LicenseKey, OwnerId, SessionToken};
