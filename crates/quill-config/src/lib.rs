//! Configuration for the Quill AI layer
//!
//! Loaded from TOML with `{{ env.VAR }}` placeholders expanded before parsing.

#![allow(clippy::must_use_candidate)]

pub mod agent;
mod env;
pub mod llm;
mod loader;
pub mod telemetry;

use serde::Deserialize;

pub use agent::*;
pub use env::ExpandError;
pub use llm::*;
pub use telemetry::{LogFormat, TelemetryConfig};

/// Top-level Quill configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// LLM provider configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Agent loop defaults
    #[serde(default)]
    pub agent: AgentConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
