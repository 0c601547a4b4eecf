//! Response body accumulation

/// Collects the body chunks of one operation in arrival order
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    buffer: Vec<u8>,
    chunks: usize,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one chunk
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
        self.chunks += 1;
    }

    /// Bytes received so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of chunks received so far, including empty ones
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Returns the concatenated body; empty if no data arrived
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}
