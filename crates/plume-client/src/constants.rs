//! Client configuration constants.
//!
//! Centralizes hardcoded values for easier configuration and documentation.

use std::time::Duration;

/// Broadcast capacity for feed change notifications. A lagging subscriber
/// loses the oldest notifications, which is harmless here — notifications
/// carry versions, not state, and the next read re-projects from scratch.
pub const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Timeout for opening the push connection. Prevents the actor from hanging
/// indefinitely on SYN blackholes or stalled servers.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
