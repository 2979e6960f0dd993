//! Newline framing over a chunked byte stream.
//!
//! Chunks may end anywhere: in the middle of a record, between the two
//! halves of a multi-byte character, or right before a newline. The framer
//! keeps the unterminated tail between chunks and only hands out lines whose
//! terminating `\n` has been seen.
//!
//! Lines are cut on the raw `\n` byte and decoded afterwards. `\n` never
//! occurs inside a multi-byte UTF-8 sequence, so a character split across
//! chunks is always reassembled before it is decoded.

/// Incremental line splitter for newline-delimited text.
///
/// # Example
///
/// ```
/// use fleetwatch_client::LineFramer;
///
/// let mut framer = LineFramer::new();
/// assert!(framer.push(b"{\"cpu_us").is_empty());
/// assert_eq!(framer.push(b"age\":42}\n"), vec!["{\"cpu_usage\":42}".to_string()]);
/// assert_eq!(framer.finish(), 0);
/// ```
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: Vec<u8>,
}

impl LineFramer {
    /// Create a framer with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completed, in order.
    ///
    /// The returned lines do not include the `\n`. Invalid UTF-8 is replaced
    /// with U+FFFD.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.pending.extend_from_slice(&rest[..pos]);
            lines.push(String::from_utf8_lossy(&self.pending).into_owned());
            self.pending.clear();
            rest = &rest[pos + 1..];
        }

        self.pending.extend_from_slice(rest);
        lines
    }

    /// Number of buffered bytes still waiting for a newline.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// End of stream: drop the unterminated tail and return its length.
    ///
    /// A tail without a trailing newline is incomplete and never becomes a
    /// record.
    pub fn finish(self) -> usize {
        self.pending.len()
    }
}
