//! CRLF line framing over an async byte source.
//!
//! [`LineReader`] buffers whatever the source hands it and scans the buffer
//! for the two-byte terminator, so a line that arrives split across several
//! reads is reassembled before it is returned.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::parser::ParseError;

/// Default cap on a single line, terminator excluded.
pub const DEFAULT_MAX_LINE_LEN: usize = 8 * 1024;

const TERMINATOR: &[u8; 2] = b"\r\n";
const READ_CHUNK: usize = 1024;

/// Lazily yields protocol lines from `inner`.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    buffer: BytesMut,
    // Bytes at the front of `buffer` already known not to start a terminator.
    scanned: usize,
    max_line_len: usize,
}

impl<R> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_max_line_len(inner, DEFAULT_MAX_LINE_LEN)
    }

    pub fn with_max_line_len(inner: R, max_line_len: usize) -> Self {
        Self {
            inner,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            scanned: 0,
            max_line_len,
        }
    }

    /// The underlying source, e.g. to write a response back on the same socket.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Returns the next line with its terminator stripped.
    ///
    /// `Ok(None)` means the source is exhausted. Bytes received after the
    /// last terminator are dropped: a truncated line is never surfaced.
    pub async fn next_line(&mut self) -> Result<Option<String>, ParseError> {
        loop {
            if let Some(end) = find_terminator(&self.buffer, self.scanned) {
                if end > self.max_line_len {
                    return Err(ParseError::LineTooLong(self.max_line_len));
                }
                let line = self.buffer.split_to(end + TERMINATOR.len());
                self.scanned = 0;
                return Ok(Some(decode(&line[..end])));
            }

            // The final byte may be a '\r' whose '\n' has not arrived yet.
            self.scanned = self.buffer.len().saturating_sub(1);
            if self.scanned > self.max_line_len {
                return Err(ParseError::LineTooLong(self.max_line_len));
            }

            self.buffer.reserve(READ_CHUNK);
            let n = self.inner.read_buf(&mut self.buffer).await?;
            if n == 0 {
                self.buffer.clear();
                self.scanned = 0;
                return Ok(None);
            }
        }
    }
}

fn find_terminator(buf: &[u8], from: usize) -> Option<usize> {
    buf[from..]
        .windows(TERMINATOR.len())
        .position(|w| w == TERMINATOR)
        .map(|pos| pos + from)
}

// One byte per character (ISO-8859-1), so any byte sequence decodes.
fn decode(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}
