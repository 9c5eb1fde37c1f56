//! Plume feed client library.
//!
//! The transport-facing half of the engine: collaborator traits the embedder
//! implements ([`FeedApi`], [`Connector`]), the SSE frame decoder, typed
//! stream events, and the session-scoped [`FeedActor`](actor) behind a
//! cloneable [`FeedHandle`].
//!
//! The synchronization semantics themselves (store, reconciliation,
//! optimistic follow set, projection) live in `plume-feed`; this crate wires
//! them to a live connection.

pub mod actor;
pub mod api;
pub mod constants;
pub mod events;
pub mod sse;

pub use actor::{FeedChange, FeedError, FeedHandle, spawn_feed};
pub use api::{ApiError, Connector, EventSource, FeedApi, StreamError};
pub use events::{
    ConnectionStatus, EVENT_POST_CREATED, EVENT_POST_DELETED, EVENT_POST_UPDATED, StreamEvent,
};
pub use sse::{SseDecoder, SseFrame};
