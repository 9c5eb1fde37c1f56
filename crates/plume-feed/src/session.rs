//! Session context.
//!
//! One authenticated session epoch, made explicit: who is signed in, which
//! identities they already follow (from the auth snapshot), and a
//! client-generated [`SessionId`] that async resolutions are checked against.
//! Passing this around — instead of consulting implicit global session
//! state — is what lets teardown be exact: a new context means a new id, and
//! anything still in flight under the old id resolves as a no-op.

use plume_types::{SessionId, UserId, now_millis};

/// Identity and seed state for one authenticated session.
///
/// Immutable after creation. Live follow state belongs to the
/// [`FollowCoordinator`](crate::follow::FollowCoordinator) this seeds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionContext {
    /// Client-generated session epoch id (UUIDv7, time-ordered).
    pub session_id: SessionId,
    /// The signed-in user. Never a member of `following` — self-follow is
    /// rejected upstream, at the caller.
    pub user_id: UserId,
    /// Display name of the signed-in user.
    pub user_name: String,
    /// Followed identities as of the auth snapshot.
    pub following: Vec<UserId>,
    /// When this session was created (Unix millis).
    pub started_at: u64,
}

impl SessionContext {
    /// Create a context for a freshly authenticated session.
    pub fn new(
        user_id: UserId,
        user_name: impl Into<String>,
        following: Vec<UserId>,
    ) -> Self {
        Self {
            session_id: SessionId::new(),
            user_id,
            user_name: user_name.into(),
            following,
            started_at: now_millis(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        let ctx = SessionContext::new(
            UserId::new("me"),
            "Luca",
            vec![UserId::new("u1"), UserId::new("u2")],
        );
        assert_eq!(ctx.user_id, UserId::new("me"));
        assert_eq!(ctx.user_name, "Luca");
        assert_eq!(ctx.following.len(), 2);
        assert!(ctx.started_at > 0);
    }

    #[test]
    fn test_each_session_gets_its_own_id() {
        let a = SessionContext::new(UserId::new("me"), "Luca", Vec::new());
        let b = SessionContext::new(UserId::new("me"), "Luca", Vec::new());
        assert_ne!(a.session_id, b.session_id);
    }
}
