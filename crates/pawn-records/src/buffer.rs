//! Bounded accumulation of a compiler's report stream.
//!
//! Report output arrives in arbitrary chunks. [`LineBuffer`] collects them,
//! drops carriage returns so Windows and Unix line endings split the same
//! way, and caps the total size so a runaway compiler cannot exhaust memory.

use crate::error::Result;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::warn;

/// Default cap on buffered report output (32 MiB).
pub const DEFAULT_OUTPUT_LIMIT: usize = 32 * 1024 * 1024;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Accumulates report output for one compiler invocation.
///
/// # Examples
///
/// ```
/// use pawn_records::LineBuffer;
///
/// let mut buffer = LineBuffer::new();
/// buffer.push_chunk(b"{\"kind\":\"tags\",\r\n");
/// buffer.push_chunk(b"\"payload\":[]}\r\n");
///
/// assert_eq!(buffer.text(), "{\"kind\":\"tags\",\n\"payload\":[]}\n");
/// ```
#[derive(Debug, Clone)]
pub struct LineBuffer {
    /// Buffered bytes with carriage returns removed.
    bytes: Vec<u8>,
    /// Maximum number of bytes kept.
    limit: usize,
    /// Set once a chunk had to be cut to respect `limit`.
    truncated: bool,
}

impl LineBuffer {
    /// Creates an empty buffer with the [default limit](DEFAULT_OUTPUT_LIMIT).
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_OUTPUT_LIMIT)
    }

    /// Creates an empty buffer that keeps at most `limit` bytes.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
            truncated: false,
        }
    }

    /// Appends a chunk of raw output, dropping `\r` bytes.
    ///
    /// Bytes beyond the limit are discarded and the buffer is marked
    /// truncated.
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        for &byte in chunk.iter().filter(|b| **b != b'\r') {
            if self.bytes.len() >= self.limit {
                if !self.truncated {
                    warn!(limit = self.limit, "Report output exceeded limit, discarding the rest");
                    self.truncated = true;
                }
                return;
            }
            self.bytes.push(byte);
        }
    }

    /// Reads `reader` to the end, appending everything to the buffer.
    ///
    /// Returns the number of raw bytes read. On error the buffer keeps what
    /// was read before the failure.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if reading from `reader` fails.
    pub async fn fill_from<R: AsyncRead + Unpin>(&mut self, reader: &mut R) -> Result<usize> {
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        let mut total = 0;

        loop {
            let read = reader.read(&mut chunk).await?;
            if read == 0 {
                return Ok(total);
            }
            total += read;
            self.push_chunk(&chunk[..read]);
        }
    }

    /// Returns the buffered output as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Number of buffered bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if nothing has been buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns `true` if output was discarded because of the limit.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Empties the buffer for the next invocation.
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.truncated = false;
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
