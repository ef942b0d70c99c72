use serde::Deserialize;

/// Effort levels accepted by `agent.effort`
pub const EFFORT_LEVELS: &[&str] = &["none", "minimal", "low", "medium", "high", "xhigh"];

/// Defaults for the agentic chat loop
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Maximum model round trips that may request tools
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Maximum output tokens per call
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Reasoning effort (see [`EFFORT_LEVELS`])
    #[serde(default)]
    pub effort: Option<String>,
    /// Replaces the built-in system preamble
    #[serde(default)]
    pub system_preamble: Option<String>,
    /// Text appended to a recent user turn
    #[serde(default)]
    pub post_instructions: Option<String>,
    /// Which user turn receives the post instructions, counted from the newest
    #[serde(default)]
    pub post_instructions_depth: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            temperature: None,
            max_tokens: None,
            effort: None,
            system_preamble: None,
            post_instructions: None,
            post_instructions_depth: 0,
        }
    }
}

const fn default_max_tool_rounds() -> u32 {
    8
}
