//! Typed stream events and connection lifecycle status.
//!
//! SSE frames are typed by their discriminator: `post-created` and
//! `post-updated` carry a full JSON post, `post-deleted` carries only the
//! identity. Payloads are validated here, before anything reaches the
//! reconciler — a frame that fails the shape check is dropped with a
//! warning, never applied.

use plume_feed::Delta;
use plume_types::{Post, PostId};
use serde::Deserialize;
use tracing::{trace, warn};

use crate::sse::SseFrame;

/// Discriminator for post creation events.
pub const EVENT_POST_CREATED: &str = "post-created";
/// Discriminator for post update events.
pub const EVENT_POST_UPDATED: &str = "post-updated";
/// Discriminator for post deletion events.
pub const EVENT_POST_DELETED: &str = "post-deleted";

/// Events pushed from server to client, decoded and validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// A new post exists.
    PostCreated(Post),
    /// An existing post changed.
    PostUpdated(Post),
    /// A post was removed.
    PostDeleted { id: PostId },
}

/// Deletion payload — the identity and nothing else.
#[derive(Deserialize)]
struct DeletePayload {
    id: PostId,
}

impl StreamEvent {
    /// Decode a typed event from an SSE frame.
    ///
    /// Returns `None` for frames this client doesn't consume (no or unknown
    /// discriminator) and for payloads failing the shape check. Neither is
    /// an error to the caller — the stream simply moves on.
    pub fn decode(frame: &SseFrame) -> Option<StreamEvent> {
        let name = match frame.event.as_deref() {
            Some(name) => name,
            None => {
                trace!("frame without event discriminator dropped");
                return None;
            }
        };
        let decoded = match name {
            EVENT_POST_CREATED => {
                serde_json::from_str::<Post>(&frame.data).map(StreamEvent::PostCreated)
            }
            EVENT_POST_UPDATED => {
                serde_json::from_str::<Post>(&frame.data).map(StreamEvent::PostUpdated)
            }
            EVENT_POST_DELETED => serde_json::from_str::<DeletePayload>(&frame.data)
                .map(|p| StreamEvent::PostDeleted { id: p.id }),
            other => {
                trace!(event = other, "unknown event kind dropped");
                return None;
            }
        };
        match decoded {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(event = name, error = %e, "malformed event payload dropped");
                None
            }
        }
    }
}

impl From<StreamEvent> for Delta {
    fn from(event: StreamEvent) -> Self {
        match event {
            StreamEvent::PostCreated(post) => Delta::Created(post),
            StreamEvent::PostUpdated(post) => Delta::Updated(post),
            StreamEvent::PostDeleted { id } => Delta::Deleted(id),
        }
    }
}

/// Connection lifecycle status, broadcast to subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Push connection open, snapshot loaded.
    Connected,
    /// No connection (before start, after stop, or server closed cleanly).
    Disconnected,
    /// The connection failed and was closed. No automatic retry — reopening
    /// is the caller's decision, via a fresh session start.
    Error(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use plume_types::UserId;

    fn post_json(id: &str) -> String {
        format!(
            r#"{{"id":"{id}","user_id":"u1","user_name":"U1","text":"hi","timestamp":1700000000000}}"#
        )
    }

    fn frame(event: &str, data: String) -> SseFrame {
        SseFrame { event: Some(event.to_owned()), data }
    }

    #[test]
    fn test_decode_created() {
        let event = StreamEvent::decode(&frame(EVENT_POST_CREATED, post_json("a"))).unwrap();
        let StreamEvent::PostCreated(post) = event else {
            panic!("expected PostCreated");
        };
        assert_eq!(post.id, PostId::new("a"));
        assert_eq!(post.author, UserId::new("u1"));
    }

    #[test]
    fn test_decode_deleted_carries_only_id() {
        let event =
            StreamEvent::decode(&frame(EVENT_POST_DELETED, r#"{"id":"gone"}"#.to_owned()))
                .unwrap();
        assert_eq!(event, StreamEvent::PostDeleted { id: PostId::new("gone") });
    }

    #[test]
    fn test_unknown_event_kind_is_dropped() {
        assert!(StreamEvent::decode(&frame("comment-created", post_json("a"))).is_none());
    }

    #[test]
    fn test_malformed_payload_is_dropped() {
        assert!(StreamEvent::decode(&frame(EVENT_POST_CREATED, "not json".to_owned())).is_none());
        // Shape violation: delete payload where a full post is required.
        assert!(
            StreamEvent::decode(&frame(EVENT_POST_UPDATED, r#"{"id":"a"}"#.to_owned())).is_none()
        );
    }

    #[test]
    fn test_event_converts_to_delta() {
        let delta: Delta =
            StreamEvent::PostDeleted { id: PostId::new("a") }.into();
        assert_eq!(delta, Delta::Deleted(PostId::new("a")));
    }
}
