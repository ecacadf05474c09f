use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tool call reported by the agent while it streams a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    pub args: Map<String, Value>,
    pub call_id: String,
}

impl ToolInvocation {
    /// Arguments pretty-printed for display.
    pub fn args_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.args).unwrap_or_else(|_| "{}".to_string())
    }
}
