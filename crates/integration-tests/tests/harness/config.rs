//! Builder for test configurations pointing providers at mock servers

use std::fmt::Write;

use quill_config::Config;

/// Accumulates TOML sections and parses them through the real loader
#[derive(Default)]
pub struct ConfigBuilder {
    toml: String,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a provider to `base_url` with the given key
    pub fn with_provider(mut self, id: &str, base_url: &str, api_key: &str) -> Self {
        writeln!(
            self.toml,
            "[llm.providers.{id}]\napi_key = \"{api_key}\"\nbase_url = \"{base_url}\"\n"
        )
        .unwrap();
        self
    }

    pub fn with_agent(mut self, agent_toml: &str) -> Self {
        writeln!(self.toml, "[agent]\n{agent_toml}\n").unwrap();
        self
    }

    pub fn build(self) -> Config {
        Config::parse(&self.toml).unwrap()
    }
}
