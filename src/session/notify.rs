//! Notifications for the rendering layer.

use crate::api::HealthStatus;
use crate::models::{ChatTurn, ToolInvocation};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ready,
    Thinking,
    Executing { tool: String },
    AgentNotReady,
    Unreachable,
    Aborted,
}

impl Status {
    pub fn level(&self) -> StatusLevel {
        match self {
            Status::Ready => StatusLevel::Success,
            Status::Thinking
            | Status::Executing { .. }
            | Status::AgentNotReady
            | Status::Aborted => StatusLevel::Warning,
            Status::Unreachable => StatusLevel::Error,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ready => write!(f, "Ready"),
            Status::Thinking => write!(f, "Thinking..."),
            Status::Executing { tool } => write!(f, "Executing: {}", tool),
            Status::AgentNotReady => write!(f, "Agent not ready"),
            Status::Unreachable => write!(f, "Cannot reach server"),
            Status::Aborted => write!(f, "Aborted"),
        }
    }
}

impl From<HealthStatus> for Status {
    fn from(health: HealthStatus) -> Self {
        match health {
            HealthStatus::Ready => Status::Ready,
            HealthStatus::AgentNotReady => Status::AgentNotReady,
            HealthStatus::Unreachable => Status::Unreachable,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    StatusChanged(Status),
    /// The agent started answering; drop any loading indicator.
    PlaceholderCleared,
    /// Full accumulated text so far.
    ContentUpdated { text: String },
    /// Every tool call seen so far in this stream.
    ToolsUpdated { tools: Vec<ToolInvocation> },
    TurnCommitted(ChatTurn),
    Error { message: String },
    Aborted,
}
