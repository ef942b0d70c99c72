use std::pin::Pin;

use futures_util::Stream;
use serde::{Deserialize, Serialize};

use super::response::FinishReason;
use crate::error::LlmError;

/// Incremental piece of a streamed completion
///
/// A stream yields any number of reasoning, content and tool-use chunks and
/// ends with exactly one `Stop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AiStreamChunk {
    /// Reasoning text fragment
    Reasoning { text: String },
    /// Answer text fragment
    Content { text: String },
    /// A complete tool call; arguments are fully reassembled
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
        /// Opaque provider signature to echo back with the call
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    /// End of generation
    Stop { finish_reason: FinishReason },
}

/// Stream of completion chunks
pub type AiStream = Pin<Box<dyn Stream<Item = Result<AiStreamChunk, LlmError>> + Send>>;
