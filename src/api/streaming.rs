//! Framing for the agent's chat stream.
//!
//! The body is a sequence of newline-terminated lines. Lines starting with
//! `data: ` carry one JSON event each; everything else (blank keep-alive
//! lines, comments, other SSE fields) is ignored. A frame's JSON never
//! contains a raw newline, so a line is always a whole frame.

use crate::api::client::ByteStream;
use crate::error::{ChatError, Result};
use crate::models::ProtocolEvent;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DATA_PREFIX: &str = "data: ";

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed frame payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse the payload of a single `data: ` line.
pub fn parse_frame(payload: &str) -> std::result::Result<ProtocolEvent, FrameError> {
    Ok(serde_json::from_str(payload)?)
}

/// Incremental line splitter that turns body chunks into protocol events.
///
/// Bytes after the last newline are held back until more data arrives, so
/// frames (and multi-byte characters) split across chunks decode the same as
/// if they had arrived in one piece.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every event completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ProtocolEvent> {
        self.pending.extend_from_slice(chunk);

        let Some(last_newline) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let complete: Vec<u8> = self.pending.drain(..=last_newline).collect();
        complete
            .split(|&b| b == b'\n')
            .filter_map(decode_line)
            .collect()
    }

    /// Decode whatever is left once the body has ended without a final newline.
    pub fn finish(&mut self) -> Vec<ProtocolEvent> {
        let rest = std::mem::take(&mut self.pending);
        decode_line(&rest).into_iter().collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

fn decode_line(raw: &[u8]) -> Option<ProtocolEvent> {
    let text = String::from_utf8_lossy(raw);
    let line = text.strip_suffix('\r').unwrap_or(&*text);
    let payload = line.strip_prefix(DATA_PREFIX)?;

    match parse_frame(payload) {
        Ok(ProtocolEvent::Unknown) => {
            debug!(frame = payload, "ignoring frame with unknown type");
            None
        }
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, frame = payload, "skipping malformed frame");
            None
        }
    }
}

struct DecodeState<S> {
    body: S,
    decoder: FrameDecoder,
    ready: VecDeque<ProtocolEvent>,
    finished: bool,
}

/// Adapt a response body into a lazy stream of events in arrival order.
///
/// A transport error is yielded once and ends the stream. When the body ends
/// cleanly, any unterminated final line is decoded before the stream ends.
pub fn decode_events<S>(body: S) -> impl Stream<Item = Result<ProtocolEvent>>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    let state = DecodeState {
        body,
        decoder: FrameDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.ready.pop_front() {
                return Some((Ok(event), state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(&chunk);
                    state.ready.extend(events);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.finished = true;
                    let events = state.decoder.finish();
                    state.ready.extend(events);
                }
            }
        }
    })
}

/// Fail `body` with [`ChatError::Timeout`] once no chunk arrives for `timeout`.
///
/// Any chunk resets the timer, including keep-alive lines that never become
/// an event.
pub fn with_chunk_timeout(body: ByteStream, timeout: Duration) -> ByteStream {
    Box::pin(stream::unfold(Some(body), move |body| async move {
        let Some(mut body) = body else {
            return None;
        };

        match tokio::time::timeout(timeout, body.next()).await {
            Ok(Some(chunk)) => Some((chunk, Some(body))),
            Ok(None) => None,
            Err(_) => Some((Err(ChatError::Timeout(timeout)), None)),
        }
    }))
}
