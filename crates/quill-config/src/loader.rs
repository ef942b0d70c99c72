use std::path::Path;

use crate::Config;
use crate::agent::EFFORT_LEVELS;
use crate::llm::PROVIDER_IDS;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let config = Self::parse(&raw)?;
        tracing::debug!(path = %path.display(), providers = config.llm.providers.len(), "configuration loaded");

        Ok(config)
    }

    /// Expand, parse and validate configuration text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error for unknown provider ids, a Vertex provider without a
    /// project, or invalid agent settings
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_llm_config()?;
        self.validate_agent_config()?;
        Ok(())
    }

    /// Validate LLM-specific configuration
    fn validate_llm_config(&self) -> anyhow::Result<()> {
        for (id, provider) in &self.llm.providers {
            if !PROVIDER_IDS.contains(&id.as_str()) {
                anyhow::bail!("unknown provider '{id}' (expected one of: {})", PROVIDER_IDS.join(", "));
            }

            if id == "google-vertex" && provider.project.as_deref().is_none_or(str::is_empty) {
                anyhow::bail!("provider 'google-vertex' requires a project");
            }

            if id != "google-vertex" && (provider.project.is_some() || provider.location.is_some()) {
                tracing::warn!(provider = %id, "project and location only apply to google-vertex, ignoring");
            }
        }

        Ok(())
    }

    /// Validate agent loop defaults
    fn validate_agent_config(&self) -> anyhow::Result<()> {
        if self.agent.max_tool_rounds == 0 {
            anyhow::bail!("agent.max_tool_rounds must be greater than 0");
        }

        if let Some(effort) = &self.agent.effort
            && !EFFORT_LEVELS.contains(&effort.as_str())
        {
            anyhow::bail!("invalid agent.effort '{effort}' (expected one of: {})", EFFORT_LEVELS.join(", "));
        }

        if let Some(temperature) = self.agent.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            anyhow::bail!("agent.temperature must be between 0 and 2");
        }

        Ok(())
    }
}
