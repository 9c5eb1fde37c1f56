//! Shared identity and post types for Plume.
//!
//! This crate is the data foundation: typed IDs and the post record that the
//! sync engine, the client, and any embedder all agree on. It has **no
//! internal plume dependencies** — a pure leaf crate that other crates build
//! on.
//!
//! # Key Types
//!
//! |---------------|--------------------------------------------------|
//! | Type          | Purpose                                          |
//! |---------------|--------------------------------------------------|
//! | [`PostId`]    | Which post (opaque, server-assigned)             |
//! | [`UserId`]    | Which user (opaque, server-assigned)             |
//! | [`SessionId`] | Which client session epoch (UUIDv7, client-side) |
//! | [`Post`]      | One feed entry as the server serializes it       |
//! |---------------|--------------------------------------------------|

pub mod ids;
pub mod post;

// Re-export primary types at crate root for convenience.
pub use ids::{PostId, SessionId, UserId};
pub use post::Post;

/// Current time as Unix milliseconds. Used by constructors across the
/// workspace.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
