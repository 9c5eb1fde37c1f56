//! Optimistic follow/unfollow coordination.
//!
//! A toggle flips the membership set immediately and hands the caller an
//! intent to confirm over the network; the confirmation resolves later and
//! either settles the optimistic state or rolls it back exactly.
//!
//! Overlapping toggles on one target are where optimistic updates go wrong:
//! two in-flight requests each closing over their own pre-toggle state can
//! disagree with the server when their outcomes differ. This coordinator
//! serializes per target instead — each identity is a small state machine
//! and a second toggle while a request is in flight is rejected as
//! [`ToggleOutcome::Busy`].
//!
//! # Per-target State Machine
//!
//! ```text
//! +--------+  toggle (not member)   +--------------+
//! |        | ---------------------▶ | pending-add  |
//! |  idle  |                        +------+-------+
//! |        |  toggle (member)              | resolve: ok   → member
//! |        | ----------------┐             | resolve: err  → rolled back
//! +--------+                 ▼             ▼
//!     ▲            +----------------+    idle
//!     |            | pending-remove |
//!     └─ resolve ─ +----------------+
//! ```
//!
//! The coordinator is sans-IO: it never issues the confirmation request
//! itself. The caller (the feed actor) sends it and routes the outcome back
//! through [`FollowCoordinator::resolve`].

use std::collections::{HashMap, HashSet};

use plume_types::UserId;
use tracing::{trace, warn};

/// Intended end state of an in-flight confirmation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowIntent {
    /// Target should end up followed.
    Follow,
    /// Target should end up unfollowed.
    Unfollow,
}

/// Result of a toggle request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The set flipped locally; the caller must now issue the confirmation
    /// request for `intent` and resolve it with `seq`.
    Started { intent: FollowIntent, seq: u64 },
    /// A request for this target is still in flight — nothing changed.
    Busy,
}

/// Result of resolving a confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Success — the optimistic state stands.
    Confirmed,
    /// Failure — the flip was compensated, pre-toggle state restored.
    RolledBack,
    /// No matching in-flight request (already resolved, or the session that
    /// issued it is gone). Tolerated no-op.
    Stale,
}

/// One in-flight confirmation.
#[derive(Clone, Copy, Debug)]
struct Pending {
    intent: FollowIntent,
    seq: u64,
}

/// Manages the followed-user set under the optimistic-update discipline.
///
/// Single writer of the set. Self-follow is disallowed by the caller, not
/// checked here — the set stores whatever identities it is told to.
#[derive(Debug, Default)]
pub struct FollowCoordinator {
    /// Identities the current user follows.
    following: HashSet<UserId>,
    /// In-flight confirmation per target. Absence = idle.
    pending: HashMap<UserId, Pending>,
    /// Logical sequence number for issued mutations.
    next_seq: u64,
    /// Membership version (bumped on flip and rollback).
    version: u64,
}

impl FollowCoordinator {
    /// Create an empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a coordinator seeded with an already-followed set (the list
    /// the auth snapshot carries at session start).
    pub fn seeded(following: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            following: following.into_iter().collect(),
            ..Self::default()
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The followed-user set.
    pub fn following(&self) -> &HashSet<UserId> {
        &self.following
    }

    /// Whether this target is currently followed (optimistic view).
    pub fn is_following(&self, target: &UserId) -> bool {
        self.following.contains(target)
    }

    /// Whether a confirmation for this target is still in flight.
    pub fn is_pending(&self, target: &UserId) -> bool {
        self.pending.contains_key(target)
    }

    /// Number of in-flight confirmations.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Get the current membership version.
    pub fn version(&self) -> u64 {
        self.version
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Toggle membership for `target`.
    ///
    /// Flips the set immediately and records the in-flight intent. Rejected
    /// with [`ToggleOutcome::Busy`] while a previous toggle on the same
    /// target is unresolved.
    pub fn toggle(&mut self, target: &UserId) -> ToggleOutcome {
        if self.pending.contains_key(target) {
            trace!(%target, "toggle rejected, confirmation in flight");
            return ToggleOutcome::Busy;
        }

        let intent = if self.following.remove(target) {
            FollowIntent::Unfollow
        } else {
            self.following.insert(target.clone());
            FollowIntent::Follow
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.version += 1;
        self.pending.insert(target.clone(), Pending { intent, seq });
        trace!(%target, ?intent, seq, "optimistic flip applied");
        ToggleOutcome::Started { intent, seq }
    }

    /// Resolve the in-flight confirmation for `target` issued at `seq`.
    ///
    /// On failure the flip is compensated: a failed follow re-removes, a
    /// failed unfollow re-adds — the pre-toggle state exactly. A resolution
    /// that matches no in-flight entry (or an outdated `seq`) is a
    /// [`ResolveOutcome::Stale`] no-op, which is how late resolutions after
    /// session teardown are tolerated.
    pub fn resolve(&mut self, target: &UserId, seq: u64, success: bool) -> ResolveOutcome {
        let pending = match self.pending.get(target) {
            Some(p) if p.seq == seq => *p,
            Some(p) => {
                warn!(%target, got = seq, expected = p.seq, "stale follow resolution ignored");
                return ResolveOutcome::Stale;
            }
            None => {
                trace!(%target, seq, "resolution for unknown target ignored");
                return ResolveOutcome::Stale;
            }
        };
        self.pending.remove(target);

        let intent = pending.intent;
        if success {
            trace!(%target, ?intent, "follow mutation confirmed");
            return ResolveOutcome::Confirmed;
        }

        match intent {
            FollowIntent::Follow => {
                self.following.remove(target);
            }
            FollowIntent::Unfollow => {
                self.following.insert(target.clone());
            }
        }
        self.version += 1;
        warn!(%target, ?intent, "confirmation failed, optimistic flip rolled back");
        ResolveOutcome::RolledBack
    }
}

// ============================================================================
// Tests
// ============================================================================
