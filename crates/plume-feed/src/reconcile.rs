//! Reconciliation — the only write path into the post store.
//!
//! Stream callbacks and fetch completions are expressed as explicit
//! [`Delta`] values consumed by one apply function, so the merge logic is
//! testable by injecting a sequence of deltas — no live transport involved.
//!
//! The stream is at-least-once: the same delta can arrive twice (reconnects
//! re-announce, brokers redeliver). Every operation here is therefore
//! idempotent — applying a delta twice leaves the store exactly as applying
//! it once.
//!
//! # State Machine
//!
//! ```text
//! +----------------+
//! |     Empty      | fresh engine, or after clear()
//! +-------+--------+
//!         | load_snapshot()  (total replacement, once per connection open)
//!         v
//! +----------------+
//! |  Materialized  | apply() folds creates/updates/deletes in
//! +-------+--------+
//!         | reconnect → load_snapshot() again (no replay guarantee
//!         v             across connections, snapshot is authoritative)
//!        ...
//! ```

use plume_types::{Post, PostId};
use tracing::{debug, trace};

use crate::store::PostStore;

/// One incremental change from the server stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delta {
    /// A post came into existence.
    Created(Post),
    /// An existing post's content changed.
    Updated(Post),
    /// A post was removed. Delete events carry only the identity.
    Deleted(PostId),
}

impl Delta {
    /// The identity this delta targets.
    pub fn post_id(&self) -> &PostId {
        match self {
            Delta::Created(p) | Delta::Updated(p) => &p.id,
            Delta::Deleted(id) => id,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Delta::Created(_) => "created",
            Delta::Updated(_) => "updated",
            Delta::Deleted(_) => "deleted",
        }
    }
}

/// Result of applying one delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyResult {
    /// The store changed.
    Applied,
    /// The delta was a no-op (see reason).
    Skipped { reason: SkipReason },
}

/// Reason why a delta did not change the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Create for an identity already present — duplicate delivery, the
    /// first observed entry wins positionally and field-wise.
    DuplicateCreate,
    /// Update for an identity the store doesn't hold.
    UnknownPost,
    /// Delete for an identity already gone (e.g. removed locally via the
    /// CRUD path before the stream echoed the deletion back).
    AlreadyAbsent,
}

/// The sole writer of a [`PostStore`].
///
/// Owns the store; everything else reads through [`Reconciler::store`].
#[derive(Debug, Default)]
pub struct Reconciler {
    store: PostStore,
}

impl Reconciler {
    /// Create a reconciler with an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the store.
    pub fn store(&self) -> &PostStore {
        &self.store
    }

    /// Atomically replace the entire store contents with a snapshot.
    ///
    /// Must run once per successful connection open, before any delta from
    /// that connection, and again on every reconnect — the stream gives no
    /// replay/backfill guarantee across connections.
    pub fn load_snapshot(&mut self, posts: Vec<Post>) {
        let count = posts.len();
        self.store.replace_all(posts);
        debug!(posts = count, version = self.store.version(), "snapshot loaded");
    }

    /// Apply one delta. Idempotent under replay.
    pub fn apply(&mut self, delta: Delta) -> ApplyResult {
        let kind = delta.kind();
        let result = match delta {
            Delta::Created(post) => {
                if self.store.insert_front(post) {
                    ApplyResult::Applied
                } else {
                    ApplyResult::Skipped { reason: SkipReason::DuplicateCreate }
                }
            }
            Delta::Updated(post) => {
                if self.store.update(post) {
                    ApplyResult::Applied
                } else {
                    ApplyResult::Skipped { reason: SkipReason::UnknownPost }
                }
            }
            Delta::Deleted(id) => {
                if self.store.remove(&id) {
                    ApplyResult::Applied
                } else {
                    ApplyResult::Skipped { reason: SkipReason::AlreadyAbsent }
                }
            }
        };
        match result {
            ApplyResult::Applied => {
                debug!(kind, version = self.store.version(), "delta applied");
            }
            ApplyResult::Skipped { reason } => {
                trace!(kind, ?reason, "delta skipped");
            }
        }
        result
    }

    /// Drop all store contents (session teardown).
    pub fn clear(&mut self) {
        self.store.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use plume_types::UserId;

    fn post(id: &str) -> Post {
        Post {
            id: PostId::new(id),
            author: UserId::new("author"),
            author_name: "Author".to_owned(),
            body: format!("body of {id}"),
            image: None,
            image_url: None,
            created_at: 1_700_000_000_000,
            edited_at: None,
        }
    }

    fn ids(r: &Reconciler) -> Vec<&str> {
        r.store().posts().iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_snapshot_then_read_is_exact() {
        let mut r = Reconciler::new();
        r.load_snapshot(vec![post("a"), post("b"), post("c")]);
        assert_eq!(ids(&r), ["a", "b", "c"]);
    }

    #[test]
    fn test_create_inserts_at_front() {
        let mut r = Reconciler::new();
        r.load_snapshot(vec![post("a")]);
        assert_eq!(r.apply(Delta::Created(post("b"))), ApplyResult::Applied);
        assert_eq!(ids(&r), ["b", "a"]);
    }

    #[test]
    fn test_duplicate_create_keeps_original() {
        let mut r = Reconciler::new();
        r.apply(Delta::Created(post("a")));

        let mut other = post("a");
        other.body = "imposter".to_owned();
        let result = r.apply(Delta::Created(other));

        assert_eq!(
            result,
            ApplyResult::Skipped { reason: SkipReason::DuplicateCreate }
        );
        assert_eq!(r.store().get(&PostId::new("a")).unwrap().body, "body of a");
    }

    #[test]
    fn test_update_preserves_position() {
        let mut r = Reconciler::new();
        r.load_snapshot(vec![post("a"), post("b"), post("c")]);

        let mut edited = post("b");
        edited.body = "edited".to_owned();
        assert_eq!(r.apply(Delta::Updated(edited)), ApplyResult::Applied);
        assert_eq!(ids(&r), ["a", "b", "c"]);
        assert_eq!(r.store().posts()[1].body, "edited");
    }

    #[test]
    fn test_update_unknown_is_skipped() {
        let mut r = Reconciler::new();
        r.load_snapshot(vec![post("a")]);
        assert_eq!(
            r.apply(Delta::Updated(post("ghost"))),
            ApplyResult::Skipped { reason: SkipReason::UnknownPost }
        );
        assert_eq!(ids(&r), ["a"]);
    }

    #[test]
    fn test_delete_after_local_removal_is_noop() {
        let mut r = Reconciler::new();
        r.load_snapshot(vec![post("a"), post("b")]);

        // First delivery removes; the replayed delivery must change nothing.
        assert_eq!(r.apply(Delta::Deleted(PostId::new("a"))), ApplyResult::Applied);
        let version = r.store().version();
        assert_eq!(
            r.apply(Delta::Deleted(PostId::new("a"))),
            ApplyResult::Skipped { reason: SkipReason::AlreadyAbsent }
        );
        assert_eq!(r.store().version(), version);
        assert_eq!(ids(&r), ["b"]);
    }

    #[test]
    fn test_replay_idempotence_across_all_kinds() {
        let mut r = Reconciler::new();
        r.load_snapshot(vec![post("a"), post("b")]);

        let mut edited = post("a");
        edited.body = "edited".to_owned();
        let deltas = [
            Delta::Created(post("c")),
            Delta::Updated(edited),
            Delta::Deleted(PostId::new("b")),
        ];

        for delta in &deltas {
            r.apply(delta.clone());
        }
        let once: Vec<Post> = r.store().posts().to_vec();

        for delta in &deltas {
            r.apply(delta.clone());
        }
        assert_eq!(r.store().posts(), &once[..]);
    }

    #[test]
    fn test_reconnect_snapshot_replaces_stale_state() {
        let mut r = Reconciler::new();
        r.load_snapshot(vec![post("a"), post("b")]);
        r.apply(Delta::Created(post("c")));

        // Reconnect: server state moved on while we were away.
        r.load_snapshot(vec![post("d"), post("a")]);
        assert_eq!(ids(&r), ["d", "a"]);
    }

    #[test]
    fn test_empty_snapshot_empties_store() {
        let mut r = Reconciler::new();
        r.load_snapshot(vec![post("a")]);
        r.load_snapshot(Vec::new());
        assert!(r.store().is_empty());
    }
}
