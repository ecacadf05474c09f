use crate::models::ToolInvocation;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Finalizing,
}

impl Phase {
    /// Connecting or streaming: a request is in flight and can be cancelled.
    pub fn is_active(&self) -> bool {
        matches!(self, Phase::Connecting | Phase::Streaming)
    }
}

/// Identifies one send. Events are only applied while their stream's id is
/// still the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(u64);

impl StreamId {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State of the current (or most recent) stream.
///
/// `text` and `tools` only ever grow while a stream is active. After the
/// stream finishes they stay as they were until the next send resets them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    pub text: String,
    pub tools: Vec<ToolInvocation>,
    pub stream: Option<StreamId>,
}

impl SessionState {
    pub fn begin(stream: StreamId) -> Self {
        Self {
            phase: Phase::Connecting,
            text: String::new(),
            tools: Vec::new(),
            stream: Some(stream),
        }
    }

    /// Whether events from `stream` may still change this state.
    pub fn accepts(&self, stream: StreamId) -> bool {
        self.phase.is_active() && self.stream == Some(stream)
    }

    /// Return to idle and forget the stream id, keeping text and tools.
    pub fn settle(&mut self) {
        self.phase = Phase::Idle;
        self.stream = None;
    }
}
