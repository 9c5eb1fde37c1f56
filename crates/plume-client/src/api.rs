//! Collaborator seams — the interfaces the feed engine consumes.
//!
//! The engine never talks HTTP itself. The embedder supplies a [`FeedApi`]
//! for the request/response calls (snapshot fetch, follow confirmation) and
//! a [`Connector`] that opens the server-push byte stream. Tests script both
//! and drive the actor without any transport.
//!
//! All traits are `?Send`: the actor runs on a local task (see
//! [`spawn_feed`](crate::actor::spawn_feed)), so implementations may hold
//! `Rc`/`RefCell` state.

use async_trait::async_trait;
use plume_types::{Post, UserId};
use thiserror::Error;

/// Request/response error.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a usable response.
    #[error("request failed: {0}")]
    Request(String),
    /// The server answered, but not with what we asked for.
    #[error("unexpected response: {0}")]
    Response(String),
}

/// Push-stream error.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Opening the connection failed.
    #[error("connect failed: {0}")]
    Connect(String),
    /// The open connection broke.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Request/response calls the engine issues.
#[async_trait(?Send)]
pub trait FeedApi {
    /// Fetch the authoritative snapshot of all posts, newest first.
    async fn fetch_timeline(&self) -> Result<Vec<Post>, ApiError>;

    /// Ask the server to make `target` followed (`true`) or unfollowed
    /// (`false`) by the current user. Resolves success/failure only — the
    /// response carries no state to merge.
    async fn set_following(&self, target: &UserId, follow: bool) -> Result<(), ApiError>;
}

/// An open server-push channel delivering raw SSE bytes.
///
/// Delivery is at-least-once: reconnects re-announce and brokers may
/// redeliver, so the consumer must treat events as possibly duplicated.
#[async_trait(?Send)]
pub trait EventSource {
    /// The next chunk of bytes, in delivery order. Chunk boundaries are
    /// arbitrary — a chunk may hold several frames or a fraction of one.
    /// `None` means the server closed the stream.
    async fn next_chunk(&mut self) -> Option<Result<Vec<u8>, StreamError>>;
}

/// Opens push connections. One per session start.
#[async_trait(?Send)]
pub trait Connector {
    type Source: EventSource;

    /// Open a new push connection.
    async fn connect(&self) -> Result<Self::Source, StreamError>;
}
