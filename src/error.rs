use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connection timeout - no data received for {0:?}")]
    Timeout(Duration),

    /// An explicit `error` event sent by the agent.
    #[error("{0}")]
    Protocol(String),

    #[error("A response is already streaming; cancel it first")]
    SessionBusy,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;
