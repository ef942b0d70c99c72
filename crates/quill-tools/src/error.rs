use thiserror::Error;

/// Failures while assembling a tool registry
///
/// Execution never produces these; tool failures are reported through
/// [`ToolResult`](crate::ToolResult).
#[derive(Debug, Error)]
pub enum ToolError {
    /// Two tools were registered under one id
    #[error("duplicate tool id: {tool}")]
    DuplicateId { tool: &'static str },

    /// Generated parameter schema could not be compiled
    #[error("invalid parameter schema for {tool}: {reason}")]
    InvalidSchema { tool: &'static str, reason: String },
}
