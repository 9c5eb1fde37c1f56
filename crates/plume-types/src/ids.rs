//! Typed identifiers for posts, users, and client sessions.
//!
//! `PostId` and `UserId` wrap the opaque strings the server assigns (ULIDs in
//! practice, but the client never relies on that — they're compared, hashed,
//! and displayed, nothing more). `SessionId` is generated client-side as a
//! UUIDv7 (time-ordered) and tags one authenticated session epoch, so a late
//! async resolution can be matched against the session that issued it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A post identifier — opaque, server-assigned, unique per post.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

/// A user identifier — opaque, server-assigned, unique per user.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

// ── Shared behavior ─────────────────────────────────────────────────────────

macro_rules! impl_opaque_id {
    ($T:ident, $name:literal) => {
        impl $T {
            /// Wrap a server-assigned identifier.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// The raw identifier string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume into the raw string.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl From<&str> for $T {
            fn from(raw: &str) -> Self {
                Self(raw.to_owned())
            }
        }

        impl From<String> for $T {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($name, "({})"), self.0)
            }
        }
    };
}

impl_opaque_id!(PostId, "PostId");
impl_opaque_id!(UserId, "UserId");

// ── Session identifier ──────────────────────────────────────────────────────

/// A client session identifier (UUIDv7, time-ordered).
///
/// One per authenticated session epoch. Never sent to the server — it exists
/// so the client can tell whether an async resolution belongs to the session
/// that is still alive.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    /// Create a new time-ordered session ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// First 8 hex characters — for human display only, not lookup.
    pub fn short(&self) -> String {
        self.0.as_simple().to_string()[..8].to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_id_equality() {
        let a = PostId::new("01J0A");
        let b = PostId::from("01J0A");
        let c = PostId::new("01J0B");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_serde_transparent() {
        let id = UserId::new("user-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"user-123\"");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_display_is_raw() {
        let id = PostId::new("abc");
        assert_eq!(id.to_string(), "abc");
        assert_eq!(format!("{id:?}"), "PostId(abc)");
    }

    #[test]
    fn test_session_ids_unique_and_ordered() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
        // UUIDv7 is time-ordered; same-millisecond ties still compare by
        // random bits, so only assert distinctness plus short() shape.
        assert_eq!(a.short().len(), 8);
    }
}
