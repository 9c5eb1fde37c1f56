//! Incremental Server-Sent-Events frame decoder.
//!
//! The server writes frames as `event: <name>\ndata: <json>\n\n`. This
//! decoder reassembles them from arbitrarily-chunked bytes: feed it whatever
//! the transport hands over and collect whole frames as they complete.
//!
//! Wire tolerance follows the SSE format rather than just what our server
//! emits today: comment lines (leading `:`) and fields we don't consume
//! (`id`, `retry`) are ignored, multiple `data` lines join with `\n`, a
//! trailing `\r` before the `\n` is stripped, and a frame that carries no
//! data at all (comment-only keep-alive) produces nothing.

/// One complete frame off the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event` field, if the frame had one.
    pub event: Option<String>,
    /// Joined `data` lines.
    pub data: String,
}

/// Streaming frame reassembler. One per connection — state does not carry
/// across reconnects.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes received but not yet terminated by a newline.
    buf: Vec<u8>,
    /// `event` field of the frame being assembled.
    event: Option<String>,
    /// `data` lines of the frame being assembled.
    data_lines: Vec<String>,
}

impl SseDecoder {
    /// Create a fresh decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk of bytes, returning every frame it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop(); // the \n
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line).into_owned();

            if line.is_empty() {
                if let Some(frame) = self.dispatch() {
                    frames.push(frame);
                }
            } else {
                self.field(&line);
            }
        }
        frames
    }

    /// Process one non-empty line.
    fn field(&mut self, line: &str) {
        // Comment / keep-alive line.
        if line.starts_with(':') {
            return;
        }
        let (name, value) = match line.split_once(':') {
            Some((name, value)) => (name, value.strip_prefix(' ').unwrap_or(value)),
            // A bare field name is a field with an empty value.
            None => (line, ""),
        };
        match name {
            "event" => self.event = Some(value.to_owned()),
            "data" => self.data_lines.push(value.to_owned()),
            // id, retry, and anything else: not consumed by this client.
            _ => {}
        }
    }

    /// Terminate the frame being assembled. Frames without data carry no
    /// payload worth forwarding, but still reset the event type.
    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data_lines.is_empty() {
            return None;
        }
        let data = self.data_lines.join("\n");
        self.data_lines.clear();
        Some(SseFrame { event, data })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(event: &str, data: &str) -> SseFrame {
        SseFrame { event: Some(event.to_owned()), data: data.to_owned() }
    }

    #[test]
    fn test_whole_frame_in_one_chunk() {
        let mut d = SseDecoder::new();
        let frames = d.feed(b"event: post-created\ndata: {\"id\":\"a\"}\n\n");
        assert_eq!(frames, vec![frame("post-created", "{\"id\":\"a\"}")]);
    }

    #[test]
    fn test_frame_split_across_arbitrary_chunks() {
        let mut d = SseDecoder::new();
        let wire = b"event: post-deleted\ndata: {\"id\":\"a\"}\n\n";
        // Byte-at-a-time is the worst case any transport can produce.
        let mut frames = Vec::new();
        for byte in wire {
            frames.extend(d.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(frames, vec![frame("post-deleted", "{\"id\":\"a\"}")]);
    }

    #[test]
    fn test_multiple_frames_per_chunk() {
        let mut d = SseDecoder::new();
        let frames = d.feed(b"event: a\ndata: 1\n\nevent: b\ndata: 2\n\n");
        assert_eq!(frames, vec![frame("a", "1"), frame("b", "2")]);
    }

    #[test]
    fn test_comment_and_unknown_fields_ignored() {
        let mut d = SseDecoder::new();
        let frames = d.feed(b": keep-alive\n\nretry: 3000\nid: 7\nevent: x\ndata: y\n\n");
        assert_eq!(frames, vec![frame("x", "y")]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut d = SseDecoder::new();
        let frames = d.feed(b"event: x\r\ndata: y\r\n\r\n");
        assert_eq!(frames, vec![frame("x", "y")]);
    }

    #[test]
    fn test_multiline_data_joins_with_newline() {
        let mut d = SseDecoder::new();
        let frames = d.feed(b"data: one\ndata: two\n\n");
        assert_eq!(frames, vec![SseFrame { event: None, data: "one\ntwo".to_owned() }]);
    }

    #[test]
    fn test_event_without_data_is_dropped_and_resets() {
        let mut d = SseDecoder::new();
        assert!(d.feed(b"event: phantom\n\n").is_empty());
        // The phantom event type must not leak into the next frame.
        let frames = d.feed(b"data: y\n\n");
        assert_eq!(frames, vec![SseFrame { event: None, data: "y".to_owned() }]);
    }

    #[test]
    fn test_space_after_colon_is_optional() {
        let mut d = SseDecoder::new();
        let frames = d.feed(b"event:x\ndata:y\n\n");
        assert_eq!(frames, vec![frame("x", "y")]);
    }
}
