//! Provider-agnostic message, request and response types
//!
//! Callers speak only these types; every adapter converts to and from its
//! own wire format in [`crate::convert`].

pub mod message;
pub mod request;
pub mod response;
pub mod stream;
pub mod tool;

pub use message::{CacheHint, Content, ContentPart, Message, Role, ToolCall};
pub use request::{AdaptiveEffort, CompletionParams, Effort};
pub use response::{AiResponse, FinishReason, Usage};
pub use stream::{AiStream, AiStreamChunk};
pub use tool::ToolDescriptor;
