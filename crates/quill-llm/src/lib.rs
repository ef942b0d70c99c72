//! AI completion gateway for Quill
//!
//! One [`Provider`] interface over three wire protocols: the OpenAI-compatible
//! chat protocol (`OpenAI`, `OpenRouter`, `DeepSeek`, xAI), Anthropic Messages,
//! and Google generative content (API-key and Vertex modes). Requests and
//! responses are expressed in the provider-agnostic types of [`types`]; each
//! adapter translates them at the boundary.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod context;
pub mod convert;
pub mod error;
pub mod protocol;
pub mod provider;
pub mod registry;
pub mod types;

pub use context::RequestContext;
pub use error::LlmError;
pub use provider::Provider;
pub use registry::{BUILTIN_PROVIDERS, ProviderEntry, ProviderId, ProviderKind, ProviderRegistry};
pub use types::{
    AiResponse, AiStream, AiStreamChunk, CacheHint, CompletionParams, Content, ContentPart, Effort, FinishReason,
    Message, Role, ToolCall, ToolDescriptor, Usage,
};
