use super::dispatch::{dispatch, Effect};
use super::notify::{Notification, Status};
use super::state::{Phase, SessionState, StreamId};
use crate::api::{decode_events, with_chunk_timeout, ChatRequest, ChatTransport, HealthStatus};
use crate::error::{ChatError, Result};
use crate::history::{ConversationHistory, DEFAULT_CONTEXT_WINDOW, DEFAULT_HISTORY_CAPACITY};
use crate::models::{ChatTurn, ProtocolEvent, ToolInvocation};
use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub history_capacity: usize,
    pub context_window: usize,
    /// Longest gap allowed between two body chunks before the stream is abandoned.
    pub stream_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            context_window: DEFAULT_CONTEXT_WINDOW,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
        }
    }
}

/// How a send that was not rejected ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed {
        text: String,
        tools: Vec<ToolInvocation>,
    },
    Aborted,
}

enum Step {
    Continue,
    Done(Result<SessionOutcome>),
}

struct Shared {
    state: SessionState,
    history: ConversationHistory,
    cancel: Option<CancellationToken>,
    last_stream: u64,
}

struct Inner<T> {
    transport: T,
    options: SessionOptions,
    session_id: String,
    notifier: UnboundedSender<Notification>,
    shared: Mutex<Shared>,
}

/// Drives one conversation against the agent service.
///
/// Cloning yields another handle to the same conversation, so one task can
/// `send` while another holds on to `cancel`. At most one stream is active
/// at a time. The lock is never held across an await.
pub struct SessionController<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for SessionController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: ChatTransport> SessionController<T> {
    pub fn new(transport: T, options: SessionOptions) -> (Self, UnboundedReceiver<Notification>) {
        let (notifier, notifications) = mpsc::unbounded_channel();
        let shared = Shared {
            state: SessionState::default(),
            history: ConversationHistory::new(options.history_capacity),
            cancel: None,
            last_stream: 0,
        };

        let controller = Self {
            inner: Arc::new(Inner {
                transport,
                options,
                session_id: super::new_session_id(),
                notifier,
                shared: Mutex::new(shared),
            }),
        };
        (controller, notifications)
    }

    /// Correlation token sent with every request from this controller.
    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn history(&self) -> Vec<ChatTurn> {
        self.lock().history.iter().cloned().collect()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().state.phase != Phase::Idle
    }

    pub async fn check_health(&self) -> HealthStatus {
        let health = match self.inner.transport.health().await {
            Ok(report) => HealthStatus::from(&report),
            Err(e) => {
                warn!(error = %e, "health check failed");
                HealthStatus::Unreachable
            }
        };
        self.notify(Notification::StatusChanged(health.into()));
        health
    }

    /// Send `message` and stream the reply until it ends, fails or is cancelled.
    ///
    /// Rejected with [`ChatError::SessionBusy`] while another stream is in
    /// flight. Agent errors come back as [`ChatError::Protocol`]; a
    /// cancellation comes back as `Ok(SessionOutcome::Aborted)`.
    pub async fn send(&self, message: &str) -> Result<SessionOutcome> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let (stream, token, request) = self.begin(message)?;
        info!(stream = %stream, session_id = %self.inner.session_id, "sending message");

        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(SessionOutcome::Aborted),
            opened = self.inner.transport.open_stream(&request) => opened,
        };
        let body = match opened {
            Ok(body) => body,
            Err(e) => return self.fail(stream, e),
        };

        if !self.mark_streaming(stream) {
            return Ok(SessionOutcome::Aborted);
        }

        let body = with_chunk_timeout(body, self.inner.options.stream_timeout);
        let events = decode_events(body);
        tokio::pin!(events);

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(SessionOutcome::Aborted),
                next = events.next() => next,
            };

            let event = match next {
                Some(Ok(event)) => event,
                Some(Err(e)) => return self.fail(stream, e),
                None => {
                    debug!(stream = %stream, "body ended without an end event");
                    ProtocolEvent::End
                }
            };

            if let Step::Done(result) = self.apply(stream, event) {
                return result;
            }
        }
    }

    /// Abort the in-flight stream, if any.
    ///
    /// Nothing from the aborted stream is applied afterwards, even if the
    /// transport keeps delivering bytes for a while.
    pub fn cancel(&self) -> bool {
        let mut shared = self.lock();
        if !shared.state.phase.is_active() {
            return false;
        }

        if let Some(token) = shared.cancel.take() {
            token.cancel();
        }
        let stream = shared.state.stream;
        shared.state.settle();
        self.notify(Notification::Aborted);
        self.notify(Notification::StatusChanged(Status::Aborted));
        info!(stream = ?stream, "stream cancelled");
        true
    }

    fn begin(&self, message: &str) -> Result<(StreamId, CancellationToken, ChatRequest)> {
        let mut shared = self.lock();
        if shared.state.phase != Phase::Idle {
            warn!(phase = ?shared.state.phase, "send rejected while a stream is active");
            return Err(ChatError::SessionBusy);
        }

        shared.last_stream += 1;
        let stream = StreamId::new(shared.last_stream);

        // Built before the user turn is stored so the message appears once.
        let messages = shared
            .history
            .build_context(message, self.inner.options.context_window);
        shared.history.append(ChatTurn::user(message));

        let token = CancellationToken::new();
        shared.cancel = Some(token.clone());
        shared.state = SessionState::begin(stream);
        self.notify(Notification::StatusChanged(Status::Thinking));

        let request = ChatRequest {
            messages,
            message: message.to_string(),
            session_id: self.inner.session_id.clone(),
        };
        Ok((stream, token, request))
    }

    fn mark_streaming(&self, stream: StreamId) -> bool {
        let mut shared = self.lock();
        if !shared.state.accepts(stream) {
            return false;
        }
        shared.state.phase = Phase::Streaming;
        debug!(stream = %stream, "response headers received");
        true
    }

    fn apply(&self, stream: StreamId, event: ProtocolEvent) -> Step {
        let mut shared = self.lock();
        if !shared.state.accepts(stream) {
            debug!(stream = %stream, event = event.kind(), "discarding event from a finished stream");
            return Step::Done(Ok(SessionOutcome::Aborted));
        }

        let (mut state, effects) = dispatch(std::mem::take(&mut shared.state), event);
        let mut step = Step::Continue;

        for effect in effects {
            match effect {
                Effect::PlaceholderCleared => self.notify(Notification::PlaceholderCleared),
                Effect::ContentUpdated(text) => {
                    self.notify(Notification::ContentUpdated { text })
                }
                Effect::ToolsUpdated(tools) => {
                    self.notify(Notification::ToolsUpdated { tools })
                }
                Effect::Status(status) => self.notify(Notification::StatusChanged(status)),
                Effect::Commit(text) => {
                    let turn = ChatTurn::assistant(text.clone());
                    if shared.history.append(turn.clone()) {
                        self.notify(Notification::TurnCommitted(turn));
                    }
                    state.settle();
                    shared.cancel = None;
                    info!(stream = %stream, chars = text.len(), tools = state.tools.len(), "stream completed");
                    step = Step::Done(Ok(SessionOutcome::Completed {
                        text,
                        tools: state.tools.clone(),
                    }));
                }
                Effect::Failed(message) => {
                    shared.cancel = None;
                    warn!(stream = %stream, %message, "agent reported an error");
                    self.notify(Notification::Error {
                        message: message.clone(),
                    });
                    step = Step::Done(Err(ChatError::Protocol(message)));
                }
            }
        }

        shared.state = state;
        step
    }

    /// End `stream` with a transport-level failure.
    fn fail(&self, stream: StreamId, error: ChatError) -> Result<SessionOutcome> {
        let mut shared = self.lock();
        if !shared.state.accepts(stream) {
            // Cancelled while the failure was in flight; the abort already won.
            return Ok(SessionOutcome::Aborted);
        }

        shared.state.settle();
        shared.cancel = None;
        warn!(stream = %stream, error = %error, "stream failed");
        self.notify(Notification::Error {
            message: error.to_string(),
        });
        self.notify(Notification::StatusChanged(Status::Ready));
        Err(error)
    }

    fn notify(&self, notification: Notification) {
        // A dropped receiver only means nobody is rendering.
        let _ = self.inner.notifier.send(notification);
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner
            .shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
