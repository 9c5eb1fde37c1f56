//! The post record as the server serializes it.
//!
//! Field names on the wire follow the server DTO (`user_id`, `user_name`,
//! `text`, `timestamp`, `edited`); the Rust names say what the fields mean to
//! the client. Timestamps are Unix milliseconds.

use serde::{Deserialize, Serialize};

use crate::ids::{PostId, UserId};

/// One feed entry.
///
/// Immutable identity, mutable content: `id` and `author` never change after
/// creation; the body and image may be replaced wholesale by an update event,
/// which also sets `edited_at`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Server-assigned identity. At most one live entry per id in a store.
    pub id: PostId,
    /// Author identity.
    #[serde(rename = "user_id")]
    pub author: UserId,
    /// Author display name, denormalized by the server into every post.
    #[serde(rename = "user_name")]
    pub author_name: String,
    /// Text body.
    #[serde(rename = "text")]
    pub body: String,
    /// Attached image object key, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Presigned fetch URL for the image. Short-lived; never used as identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Creation instant (Unix millis, server clock).
    #[serde(rename = "timestamp")]
    pub created_at: u64,
    /// Last edit instant (Unix millis), absent if never edited.
    #[serde(rename = "edited", default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<u64>,
}

impl Post {
    /// Whether this post has been edited since creation.
    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Post {
        Post {
            id: PostId::new("01J0POST"),
            author: UserId::new("01J0USER"),
            author_name: "luca".to_owned(),
            body: "hello world".to_owned(),
            image: None,
            image_url: None,
            created_at: 1_700_000_000_000,
            edited_at: None,
        }
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["user_id"], "01J0USER");
        assert_eq!(json["user_name"], "luca");
        assert_eq!(json["text"], "hello world");
        assert_eq!(json["timestamp"], 1_700_000_000_000u64);
        // Optional fields are omitted entirely when absent.
        assert!(json.get("image").is_none());
        assert!(json.get("edited").is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut post = sample();
        post.image = Some("uploads/abc.png".to_owned());
        post.image_url = Some("https://cdn.example/abc.png?sig=x".to_owned());
        post.edited_at = Some(1_700_000_100_000);

        let json = serde_json::to_string(&post).unwrap();
        let back: Post = serde_json::from_str(&json).unwrap();
        assert_eq!(back, post);
        assert!(back.is_edited());
    }

    #[test]
    fn test_decodes_minimal_server_payload() {
        // What the server actually sends for a fresh text-only post.
        let raw = r#"{
            "id": "01J0POST",
            "user_id": "01J0USER",
            "user_name": "luca",
            "text": "hello world",
            "timestamp": 1700000000000
        }"#;
        let post: Post = serde_json::from_str(raw).unwrap();
        assert_eq!(post, sample());
        assert!(!post.is_edited());
    }
}
