use std::collections::VecDeque;

/// Incremental line framer for SSE bodies.
///
/// Network chunks rarely line up with SSE lines, so bytes are held until a
/// `\n` arrives. Splitting happens on raw bytes: `\n` never appears inside a
/// multi-byte UTF-8 sequence, so a character cut in half by a chunk boundary
/// is decoded only once both halves are buffered.
#[derive(Debug, Default)]
pub struct SseFrameBuffer {
    buffer: VecDeque<u8>,
}

impl SseFrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a chunk and return every line it completed, in order.
    /// The trailing partial line stays buffered for the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend(chunk);

        let mut lines = Vec::new();
        while let Some(line) = self.next_line() {
            lines.push(line);
        }
        lines
    }

    /// Extract next line (up to \n) from buffer, without the terminator.
    /// Returns None if no complete line is available.
    pub fn next_line(&mut self) -> Option<String> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;

        let mut line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        line_bytes.pop();

        Some(String::from_utf8_lossy(&line_bytes).into_owned())
    }

    /// Bytes of the pending partial line
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
