use serde::{Deserialize, Serialize};

/// Model-facing description of a callable tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name the model uses in its calls
    pub name: String,
    /// What the tool does and when to use it
    pub description: String,
    /// JSON Schema of the arguments object
    pub parameters: serde_json::Value,
}
