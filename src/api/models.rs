use crate::models::ChatTurn;
use serde::{Deserialize, Serialize};

/// One entry of the context window as the agent service sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: String,
    pub content: String,
}

impl ContextMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

impl From<&ChatTurn> for ContextMessage {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            role: turn.role.wire_name().to_string(),
            content: turn.content.clone(),
        }
    }
}

/// Body of `POST /chat/stream`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ContextMessage>,
    /// The current user message on its own, for servers that only read this field.
    pub message: String,
    pub session_id: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub agent_ready: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Ready,
    AgentNotReady,
    Unreachable,
}

impl From<&HealthReport> for HealthStatus {
    fn from(report: &HealthReport) -> Self {
        if report.status == "healthy" && report.agent_ready {
            HealthStatus::Ready
        } else {
            HealthStatus::AgentNotReady
        }
    }
}
