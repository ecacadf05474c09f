//! Pure transition function from protocol events to session state.
//!
//! Feeding the same event sequence always yields the same final text, tool
//! list and effects, so a stream can be replayed without a transport.

use super::notify::Status;
use super::state::{Phase, SessionState};
use crate::models::{ProtocolEvent, ToolInvocation};
use tracing::{debug, trace};

/// What changed, for the controller to act on and pass to observers.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    PlaceholderCleared,
    ContentUpdated(String),
    ToolsUpdated(Vec<ToolInvocation>),
    Status(Status),
    /// The stream ended; this text becomes the assistant turn.
    Commit(String),
    /// The agent reported an error; nothing is committed.
    Failed(String),
}

/// Apply one event to `state`.
///
/// `End` leaves the state in [`Phase::Finalizing`] next to an
/// [`Effect::Commit`]; whoever applies the commit settles the state to
/// [`Phase::Idle`] afterwards. An `Error` settles immediately.
pub fn dispatch(mut state: SessionState, event: ProtocolEvent) -> (SessionState, Vec<Effect>) {
    if !state.phase.is_active() {
        debug!(event = event.kind(), phase = ?state.phase, "event ignored outside an active stream");
        return (state, Vec::new());
    }
    trace!(event = event.kind(), "dispatching");

    let effects = match event {
        ProtocolEvent::Start => {
            state.phase = Phase::Streaming;
            vec![Effect::PlaceholderCleared]
        }
        ProtocolEvent::Token { content } => {
            state.text.push_str(&content);
            vec![Effect::ContentUpdated(state.text.clone())]
        }
        // Start and complete for the same call both land in the list.
        ProtocolEvent::ToolCallStart {
            name,
            args,
            call_id,
        }
        | ProtocolEvent::ToolCallComplete {
            name,
            args,
            call_id,
        } => {
            state.tools.push(ToolInvocation {
                name,
                args,
                call_id: call_id.unwrap_or_else(fallback_call_id),
            });
            vec![Effect::ToolsUpdated(state.tools.clone())]
        }
        ProtocolEvent::ToolResult { tool_name } => {
            vec![Effect::Status(Status::Executing { tool: tool_name })]
        }
        ProtocolEvent::Ping | ProtocolEvent::Unknown => Vec::new(),
        ProtocolEvent::End => {
            state.phase = Phase::Finalizing;
            vec![
                Effect::Status(Status::Ready),
                Effect::Commit(state.text.clone()),
            ]
        }
        ProtocolEvent::Error { message } => {
            state.settle();
            let message = if message.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                message
            };
            vec![Effect::Failed(message), Effect::Status(Status::Ready)]
        }
    };

    (state, effects)
}

/// Replay a whole event sequence from `state`, collecting every effect.
///
/// A sequence ending in `End` stays in [`Phase::Finalizing`] until the caller
/// has handled the final commit.
pub fn replay<I>(state: SessionState, events: I) -> (SessionState, Vec<Effect>)
where
    I: IntoIterator<Item = ProtocolEvent>,
{
    events
        .into_iter()
        .fold((state, Vec::new()), |(state, mut effects), event| {
            let (state, new_effects) = dispatch(state, event);
            effects.extend(new_effects);
            (state, effects)
        })
}

fn fallback_call_id() -> String {
    format!("call_{}", chrono::Utc::now().timestamp_millis())
}
