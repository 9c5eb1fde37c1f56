//! Plume synchronization core.
//!
//! Merges three independent sources of truth into one coherent client-side
//! view of a feed:
//!
//! - a one-shot snapshot fetch (authoritative total replacement),
//! - a server-push event stream (incremental create/update/delete deltas),
//! - locally-initiated optimistic follow/unfollow mutations racing against
//!   their network confirmation.
//!
//! Everything in this crate is synchronous, transport-free, and
//! single-writer: the [`Reconciler`] is the only writer of the [`PostStore`],
//! the [`FollowCoordinator`] is the only writer of the membership set, and
//! the timeline projection reads both without owning anything. The async
//! plumbing that feeds this crate lives in `plume-client`.
//!
//! ```text
//! snapshot fetch ──┐
//!                  ├──▶ Reconciler ──▶ PostStore ──┐
//! event stream  ───┘                               ├──▶ project() ──▶ view
//! toggle/resolve ────▶ FollowCoordinator ──▶ set ──┘
//! ```

pub mod follow;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod timeline;

pub use follow::{FollowCoordinator, FollowIntent, ResolveOutcome, ToggleOutcome};
pub use reconcile::{ApplyResult, Delta, Reconciler, SkipReason};
pub use session::SessionContext;
pub use store::PostStore;
pub use timeline::{ViewMode, project};
