//! Tool catalog and executor for model-driven project edits
//!
//! A [`ToolRegistry`] holds the 27 built-in tools. Each tool's parameters are
//! one Rust type from which both the model-facing JSON Schema and the runtime
//! validator are generated. [`ToolRegistry::execute`] validates the model's
//! arguments, runs the tool against a [`ProjectStore`] and always answers with
//! a [`ToolResult`]; approval gating is left to the caller through
//! [`ToolRegistry::requires_approval`].

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod error;
pub mod registry;
pub mod result;
pub mod schema;
pub mod store;
mod tools;

pub use error::ToolError;
pub use registry::{Tool, ToolDefinition, ToolRegistry};
pub use result::ToolResult;
pub use store::{InMemoryStore, ProjectStore, ToolContext};
