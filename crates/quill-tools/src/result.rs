use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of one tool execution, as fed back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    /// Short human-readable summary, or the failure reason
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResult {
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Failure for a lookup that found nothing
    pub fn not_found(kind: &str, id: &str) -> Self {
        Self::failure(format!("{kind} not found: {id}"))
    }

    /// JSON text handed back to the model as the tool message body
    pub fn to_model_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }
}
