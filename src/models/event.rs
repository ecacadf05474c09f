use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// One decoded `data: {...}` frame from the chat stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolEvent {
    Start,
    Token {
        #[serde(default)]
        content: String,
    },
    ToolCallStart {
        #[serde(rename = "tool_name", default)]
        name: String,
        #[serde(rename = "tool_args", default, deserialize_with = "args_or_empty")]
        args: Map<String, Value>,
        #[serde(rename = "tool_call_id", default, deserialize_with = "call_id_as_string")]
        call_id: Option<String>,
    },
    ToolCallComplete {
        #[serde(rename = "tool_name", default)]
        name: String,
        #[serde(rename = "tool_args", default, deserialize_with = "args_or_empty")]
        args: Map<String, Value>,
        #[serde(rename = "tool_call_id", default, deserialize_with = "call_id_as_string")]
        call_id: Option<String>,
    },
    ToolResult {
        #[serde(default)]
        tool_name: String,
    },
    Ping,
    End,
    Error {
        #[serde(rename = "error", default)]
        message: String,
    },
    /// Any tag this client does not know. Dropped by the decoder.
    #[serde(other)]
    Unknown,
}

impl ProtocolEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolEvent::Start => "start",
            ProtocolEvent::Token { .. } => "token",
            ProtocolEvent::ToolCallStart { .. } => "tool_call_start",
            ProtocolEvent::ToolCallComplete { .. } => "tool_call_complete",
            ProtocolEvent::ToolResult { .. } => "tool_result",
            ProtocolEvent::Ping => "ping",
            ProtocolEvent::End => "end",
            ProtocolEvent::Error { .. } => "error",
            ProtocolEvent::Unknown => "unknown",
        }
    }
}

// `tool_args` is a JSON object in practice, but servers send `null` when a
// tool takes no arguments.
fn args_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    })
}

// Servers disagree on whether call ids are strings or numbers.
fn call_id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(id)) if !id.is_empty() => Some(id),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}
