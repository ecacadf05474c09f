pub mod controller;
pub mod dispatch;
pub mod notify;
pub mod state;

pub use controller::{SessionController, SessionOptions, SessionOutcome, DEFAULT_STREAM_TIMEOUT};
pub use dispatch::{dispatch, replay, Effect};
pub use notify::{Notification, Status, StatusLevel};
pub use state::{Phase, SessionState, StreamId};

use uuid::Uuid;

/// Fresh `session_<suffix>` correlation token, opaque to everything but the server.
pub fn new_session_id() -> String {
    format!("session_{}", Uuid::new_v4().simple())
}
