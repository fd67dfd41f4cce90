//! # Keyward Auth
//!
//! The authorization gate: resolves a caller's session token to a [`Rank`]
//! via the identity store and checks it against a required minimum before a
//! privileged lifecycle operation runs.
//!
//! ## Key Types
//!
//! - [`require_rank`] - The gate itself: one identity lookup, one comparison
//! - [`RankPolicy`] - Declarative minimum ranks per privileged operation
//! - [`AuthError`] - Denial reasons (unknown token, insufficient rank)
//!
//! ## Ordering
//!
//! The gate is always evaluated before any license lookup, so a denied
//! caller learns nothing about whether a given key exists.
//!
//! [`Rank`]: keyward_core::Rank

pub mod error;
pub mod gate;
pub mod policy;

pub use error::{AuthError, Result};
pub use gate::require_rank;
pub use policy::RankPolicy;
