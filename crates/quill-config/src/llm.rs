use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Provider ids accepted under `[llm.providers]`
pub const PROVIDER_IDS: &[&str] = &[
    "openai",
    "openrouter",
    "deepseek",
    "xai",
    "anthropic",
    "google",
    "google-vertex",
];

/// Top-level LLM configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Per-provider settings keyed by provider id
    #[serde(default)]
    pub providers: IndexMap<String, LlmProviderConfig>,
}

impl LlmConfig {
    /// Settings for a provider id, if configured
    pub fn provider(&self, id: &str) -> Option<&LlmProviderConfig> {
        self.providers.get(id)
    }
}

/// Settings for a single built-in provider
///
/// Every field is optional; unset fields fall back to the built-in table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmProviderConfig {
    /// API key, or an OAuth access token for Vertex
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Model used when the caller names none
    #[serde(default)]
    pub default_model: Option<String>,
    /// Extra headers sent with every request (e.g. `OpenRouter` attribution)
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Google Cloud project (Vertex only)
    #[serde(default)]
    pub project: Option<String>,
    /// Google Cloud location (Vertex only)
    #[serde(default)]
    pub location: Option<String>,
}
