//! Timeline projection — the derived, filtered view of the store.
//!
//! Pure computation: no caching, no state, recomputed per display request.
//! Cheap enough to run on every store or membership change for feeds in the
//! low thousands.

use std::collections::HashSet;

use plume_types::{Post, UserId};
use strum::EnumString;

use crate::store::PostStore;

/// Which timeline the caller wants. A projection parameter, never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, strum::Display)]
#[strum(ascii_case_insensitive)]
pub enum ViewMode {
    /// Every post, in store order.
    #[default]
    #[strum(serialize = "global")]
    Global,
    /// Own posts plus posts from followed authors.
    #[strum(serialize = "personal")]
    Personal,
}

/// Project the store through a view mode.
///
/// `Global` returns the store's order unchanged. `Personal` keeps posts
/// whose author is `self_id` or a member of `following` — an
/// order-preserving filter with an O(1) membership test per post.
pub fn project<'a>(
    store: &'a PostStore,
    following: &HashSet<UserId>,
    self_id: &UserId,
    mode: ViewMode,
) -> Vec<&'a Post> {
    match mode {
        ViewMode::Global => store.posts().iter().collect(),
        ViewMode::Personal => store
            .posts()
            .iter()
            .filter(|p| &p.author == self_id || following.contains(&p.author))
            .collect(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use plume_types::PostId;
    use std::str::FromStr;

    fn post(id: &str, author: &str) -> Post {
        Post {
            id: PostId::new(id),
            author: UserId::new(author),
            author_name: author.to_owned(),
            body: format!("post {id}"),
            image: None,
            image_url: None,
            created_at: 1_700_000_000_000,
            edited_at: None,
        }
    }

    fn store(posts: Vec<Post>) -> PostStore {
        let mut s = PostStore::new();
        s.replace_all(posts);
        s
    }

    #[test]
    fn test_global_is_store_order_unchanged() {
        let s = store(vec![post("1", "u1"), post("2", "u2"), post("3", "me")]);
        let view = project(&s, &HashSet::new(), &UserId::new("me"), ViewMode::Global);
        let ids: Vec<_> = view.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn test_personal_keeps_followed_and_self_in_order() {
        let s = store(vec![post("1", "u1"), post("2", "u2"), post("3", "me")]);
        let following: HashSet<UserId> = [UserId::new("u1")].into_iter().collect();

        let view = project(&s, &following, &UserId::new("me"), ViewMode::Personal);
        let ids: Vec<_> = view.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn test_personal_with_nothing_followed_is_own_posts() {
        let s = store(vec![post("1", "u1"), post("2", "me"), post("3", "u2")]);
        let view = project(&s, &HashSet::new(), &UserId::new("me"), ViewMode::Personal);
        let ids: Vec<_> = view.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["2"]);
    }

    #[test]
    fn test_view_mode_parses() {
        assert_eq!(ViewMode::from_str("global").unwrap(), ViewMode::Global);
        assert_eq!(ViewMode::from_str("Personal").unwrap(), ViewMode::Personal);
        assert!(ViewMode::from_str("firehose").is_err());
        assert_eq!(ViewMode::Personal.to_string(), "personal");
    }
}
