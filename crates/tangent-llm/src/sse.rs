//! Incremental decode of a completion endpoint's SSE byte stream into
//! `TokenDelta`s, tolerant of chunk boundaries landing mid-JSON.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

use crate::backend::BackendProfile;
use crate::error::TransportError;
use crate::types::TokenDelta;

/// Line-oriented byte buffer for SSE framing. Partial reads stay buffered
/// until their terminating newline arrives.
pub struct SseLineBuffer {
    buffer: VecDeque<u8>,
}

impl SseLineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Next complete line, trimmed. Invalid UTF-8 is replaced rather than
    /// fatal; the JSON parse downstream rejects garbage on its own.
    pub fn next_line(&mut self) -> Option<String> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        Some(String::from_utf8_lossy(&line_bytes).trim().to_string())
    }

    /// Whatever is left when the stream ends without a final newline
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest: Vec<u8> = self.buffer.drain(..).collect();
        let line = String::from_utf8_lossy(&rest).trim().to_string();
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

enum LineOutcome {
    Delta(TokenDelta),
    Done,
    Skip,
}

fn handle_line(line: &str, profile: &'static BackendProfile) -> LineOutcome {
    if line.is_empty() {
        return LineOutcome::Skip;
    }
    let Some(data) = line.strip_prefix("data:").map(str::trim) else {
        return LineOutcome::Skip;
    };
    if data == "[DONE]" {
        return LineOutcome::Done;
    }
    match serde_json::from_str::<serde_json::Value>(data) {
        Ok(payload) => {
            let delta = (profile.extract)(&payload);
            if delta.is_empty() {
                LineOutcome::Skip
            } else {
                LineOutcome::Delta(delta)
            }
        }
        Err(e) => {
            // A single undecodable payload never aborts the stream
            tracing::debug!("skipping malformed SSE chunk: {}", e);
            LineOutcome::Skip
        }
    }
}

/// Decode a byte-chunk stream as SSE, yielding one `TokenDelta` per event the
/// backend's extractor recognizes. Terminates on `data: [DONE]`, stream end,
/// or cancellation; a trailing unterminated buffer is flushed through the
/// same path when the stream ends without an explicit `[DONE]`.
pub fn decode_sse<S>(
    bytes: S,
    profile: &'static BackendProfile,
    cancel: CancellationToken,
) -> Pin<Box<dyn Stream<Item = Result<TokenDelta, TransportError>> + Send>>
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(bytes);
        let mut buffer = SseLineBuffer::with_capacity(4096);

        loop {
            let chunk_result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    yield Err(TransportError::Cancelled);
                    return;
                }
                chunk = byte_chunks.next() => chunk,
            };

            let Some(chunk_result) = chunk_result else {
                break;
            };

            match chunk_result {
                Ok(bytes) => {
                    buffer.extend(&bytes);
                    while let Some(line) = buffer.next_line() {
                        match handle_line(&line, profile) {
                            LineOutcome::Delta(delta) => yield Ok(delta),
                            LineOutcome::Done => return,
                            LineOutcome::Skip => {}
                        }
                    }
                }
                Err(e) => {
                    yield Err(TransportError::Network(e));
                    return;
                }
            }
        }

        if let Some(line) = buffer.take_remainder() {
            if let LineOutcome::Delta(delta) = handle_line(&line, profile) {
                yield Ok(delta);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_yields_complete_lines() {
        let mut buffer = SseLineBuffer::with_capacity(64);
        buffer.extend(b"line1\nline2\n");
        assert_eq!(buffer.next_line().unwrap(), "line1");
        assert_eq!(buffer.next_line().unwrap(), "line2");
        assert!(buffer.next_line().is_none());
    }

    #[test]
    fn buffer_holds_partial_line() {
        let mut buffer = SseLineBuffer::with_capacity(64);
        buffer.extend(b"partial");
        assert!(buffer.next_line().is_none());
        buffer.extend(b" line\n");
        assert_eq!(buffer.next_line().unwrap(), "partial line");
    }

    #[test]
    fn remainder_is_flushed() {
        let mut buffer = SseLineBuffer::with_capacity(64);
        buffer.extend(b"data: tail");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.take_remainder().unwrap(), "data: tail");
        assert!(buffer.is_empty());
    }
}
