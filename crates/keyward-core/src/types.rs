//! Strong type definitions for Keyward.
//!
//! All identifiers are newtypes to prevent misuse at compile time. License
//! keys and session tokens are credentials, so their `Display` and `Debug`
//! impls never print the full value.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::keyspace::KEY_ALPHABET;
use crate::rank::Rank;

/// An opaque license key drawn from the fixed key alphabet.
///
/// This is the primary identifier of a license. It is immutable once
/// created and globally unique among stored licenses.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseKey(String);

impl LicenseKey {
    /// Parse a key, validating every character against the key alphabet.
    pub fn parse(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.is_empty() {
            return Err(CoreError::EmptyKey);
        }
        for c in s.chars() {
            if !KEY_ALPHABET.contains(&(c as u8)) || !c.is_ascii() {
                return Err(CoreError::InvalidKeyCharacter(c));
            }
        }
        Ok(Self(s))
    }

    /// Construct from a string already known to be alphabet-valid.
    pub(crate) fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    /// The full key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters in the key.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is empty (never true for a parsed key).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Keys are credentials: show only a short prefix in logs.
impl fmt::Debug for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LicenseKey({})", redact(&self.0))
    }
}

impl fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", redact(&self.0))
    }
}

/// A caller-supplied session token resolved to a rank by the identity store.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken({})", redact(&self.0))
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", redact(&self.0))
    }
}

/// Reference to the user identity that claimed a license.
///
/// Opaque to the engine; the external user store defines its shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A caller identity as seen by the authorization gate.
///
/// The lifecycle engine only ever reads `rank`; everything else is carried
/// for the embedding layer's benefit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The session token presented by the caller.
    pub token: SessionToken,

    /// Human-readable account name.
    pub username: String,

    /// Permission tier.
    pub rank: Rank,

    /// When the identity was created (Unix ms).
    pub created: i64,
}

impl Identity {
    pub fn new(token: SessionToken, username: impl Into<String>, rank: Rank, created: i64) -> Self {
        Self {
            token,
            username: username.into(),
            rank,
            created,
        }
    }
}

/// Show at most the first four characters of a credential.
fn redact(s: &str) -> String {
    let prefix: String = s.chars().take(4).collect();
    if s.chars().count() > 4 {
        format!("{prefix}..")
    } else {
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_key() {
        let key = LicenseKey::parse("Abc.123xyz").unwrap();
        assert_eq!(key.as_str(), "Abc.123xyz");
        assert_eq!(key.len(), 10);
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(LicenseKey::parse(""), Err(CoreError::EmptyKey));
    }

    #[test]
    fn test_parse_rejects_foreign_characters() {
        assert_eq!(
            LicenseKey::parse("abc-def"),
            Err(CoreError::InvalidKeyCharacter('-'))
        );
        assert_eq!(
            LicenseKey::parse("abc def"),
            Err(CoreError::InvalidKeyCharacter(' '))
        );
        assert!(LicenseKey::parse("abcé").is_err());
    }

    #[test]
    fn test_key_display_is_redacted() {
        let key = LicenseKey::parse("SECRETKEY123").unwrap();
        let shown = format!("{key}");
        assert_eq!(shown, "SECR..");
        assert!(!format!("{key:?}").contains("SECRETKEY123"));
    }

    #[test]
    fn test_short_key_display_not_padded() {
        let key = LicenseKey::parse("ab").unwrap();
        assert_eq!(format!("{key}"), "ab");
    }

    #[test]
    fn test_token_display_is_redacted() {
        let token = SessionToken::new("deadbeefcafe");
        assert_eq!(format!("{token}"), "dead..");
    }

    #[test]
    fn test_key_serde_transparent() {
        let key = LicenseKey::parse("abc123").unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"abc123\"");
        let back: LicenseKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
