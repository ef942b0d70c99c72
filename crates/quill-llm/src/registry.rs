//! Built-in provider table and the registry of instantiated adapters

use std::collections::HashMap;
use std::sync::Arc;

use quill_config::{LlmConfig, LlmProviderConfig};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use url::Url;

use crate::error::LlmError;
use crate::provider::Provider;
use crate::provider::anthropic::AnthropicProvider;
use crate::provider::google::{DEFAULT_VERTEX_LOCATION, GoogleMode, GoogleProvider};
use crate::provider::openai::OpenAiProvider;

/// Identifier of a built-in provider
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ProviderId {
    Openai,
    Openrouter,
    Deepseek,
    Xai,
    Anthropic,
    Google,
    GoogleVertex,
}

/// Which adapter serves a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Chat completions protocol at a fixed base URL
    OpenAiCompatible {
        /// Vendor API root
        base_url: &'static str,
    },
    /// Anthropic Messages
    Anthropic,
    /// Generative Language API
    Google,
    /// Vertex AI
    GoogleVertex,
}

/// Static description of a built-in provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderEntry {
    /// Provider id
    pub id: ProviderId,
    /// Display name
    pub label: &'static str,
    /// Model used when the caller names none
    pub default_model: &'static str,
    /// Shape of a valid credential, for display
    pub api_key_hint: &'static str,
    /// Adapter serving the provider
    pub kind: ProviderKind,
}

/// Built-in provider table
pub const BUILTIN_PROVIDERS: &[ProviderEntry] = &[
    ProviderEntry {
        id: ProviderId::Openai,
        label: "OpenAI",
        default_model: "gpt-5-mini",
        api_key_hint: "sk-...",
        kind: ProviderKind::OpenAiCompatible {
            base_url: "https://api.openai.com/v1",
        },
    },
    ProviderEntry {
        id: ProviderId::Openrouter,
        label: "OpenRouter",
        default_model: "anthropic/claude-sonnet-4.5",
        api_key_hint: "sk-or-...",
        kind: ProviderKind::OpenAiCompatible {
            base_url: "https://openrouter.ai/api/v1",
        },
    },
    ProviderEntry {
        id: ProviderId::Deepseek,
        label: "DeepSeek",
        default_model: "deepseek-chat",
        api_key_hint: "sk-...",
        kind: ProviderKind::OpenAiCompatible {
            base_url: "https://api.deepseek.com/v1",
        },
    },
    ProviderEntry {
        id: ProviderId::Xai,
        label: "xAI",
        default_model: "grok-4",
        api_key_hint: "xai-...",
        kind: ProviderKind::OpenAiCompatible {
            base_url: "https://api.x.ai/v1",
        },
    },
    ProviderEntry {
        id: ProviderId::Anthropic,
        label: "Anthropic",
        default_model: "claude-sonnet-4-5",
        api_key_hint: "sk-ant-...",
        kind: ProviderKind::Anthropic,
    },
    ProviderEntry {
        id: ProviderId::Google,
        label: "Google AI Studio",
        default_model: "gemini-2.5-pro",
        api_key_hint: "AIza...",
        kind: ProviderKind::Google,
    },
    ProviderEntry {
        id: ProviderId::GoogleVertex,
        label: "Google Vertex AI",
        default_model: "gemini-2.5-pro",
        api_key_hint: "OAuth access token",
        kind: ProviderKind::GoogleVertex,
    },
];

impl ProviderId {
    /// Built-in table entry for this id
    ///
    /// # Panics
    ///
    /// Panics if the built-in table lacks the id (should never happen).
    pub fn entry(self) -> &'static ProviderEntry {
        BUILTIN_PROVIDERS
            .iter()
            .find(|entry| entry.id == self)
            .unwrap_or_else(|| unreachable!("every provider id has a built-in entry"))
    }

    /// Parse a provider id string
    pub fn parse(id: &str) -> Result<Self, LlmError> {
        id.parse().map_err(|_| LlmError::ProviderNotFound {
            provider: id.to_owned(),
        })
    }
}

/// One instantiated provider with its effective settings
struct RegisteredProvider {
    entry: &'static ProviderEntry,
    default_model: String,
    provider: Arc<dyn Provider>,
}

/// Registry of instantiated provider adapters
///
/// Built once at startup; every lookup is read-only.
pub struct ProviderRegistry {
    providers: HashMap<ProviderId, RegisteredProvider>,
}

impl ProviderRegistry {
    /// Instantiate every built-in provider, applying configured overrides
    ///
    /// `google-vertex` is only instantiated when a project is configured.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::ProviderNotFound` for a configured id outside the
    /// built-in table, or `LlmError::InvalidRequest` for an unusable Vertex
    /// location.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        for id in config.providers.keys() {
            ProviderId::parse(id)?;
        }

        let default_config = LlmProviderConfig::default();
        let mut providers = HashMap::with_capacity(BUILTIN_PROVIDERS.len());

        for entry in BUILTIN_PROVIDERS {
            let id = entry.id.to_string();
            let overrides = config.provider(&id).unwrap_or(&default_config);

            let Some(provider) = instantiate(entry, overrides)? else {
                tracing::debug!(provider = %id, "skipping provider without required settings");
                continue;
            };

            providers.insert(
                entry.id,
                RegisteredProvider {
                    entry,
                    default_model: overrides
                        .default_model
                        .clone()
                        .unwrap_or_else(|| entry.default_model.to_owned()),
                    provider,
                },
            );
        }

        tracing::debug!(count = providers.len(), "provider registry initialized");

        Ok(Self { providers })
    }

    /// Adapter for a provider id, if instantiated
    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn Provider>> {
        self.providers.get(&id).map(|p| Arc::clone(&p.provider))
    }

    /// Adapter and effective default model for a provider id string
    ///
    /// # Errors
    ///
    /// Returns `LlmError::ProviderNotFound` for unknown or uninstantiated ids.
    pub fn resolve(&self, id: &str) -> Result<(Arc<dyn Provider>, &str), LlmError> {
        let parsed = ProviderId::parse(id)?;
        self.providers
            .get(&parsed)
            .map(|p| (Arc::clone(&p.provider), p.default_model.as_str()))
            .ok_or_else(|| LlmError::ProviderNotFound { provider: id.to_owned() })
    }

    /// Instantiated providers with their effective default model, in table order
    pub fn entries(&self) -> impl Iterator<Item = (&'static ProviderEntry, &str)> {
        ProviderId::iter()
            .filter_map(|id| self.providers.get(&id))
            .map(|p| (p.entry, p.default_model.as_str()))
    }
}

fn instantiate(entry: &ProviderEntry, config: &LlmProviderConfig) -> Result<Option<Arc<dyn Provider>>, LlmError> {
    let name = entry.id.to_string();
    let headers = crate::provider::parse_headers(&name, &config.headers);

    let provider: Arc<dyn Provider> = match entry.kind {
        ProviderKind::OpenAiCompatible { base_url } => {
            let base_url = match &config.base_url {
                Some(url) => url.clone(),
                None => Url::parse(base_url)
                    .map_err(|e| LlmError::Internal(anyhow::anyhow!("invalid built-in base URL {base_url}: {e}")))?,
            };
            Arc::new(OpenAiProvider::new(name, base_url, headers))
        }
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(name, config.base_url.clone(), headers)),
        ProviderKind::Google => Arc::new(GoogleProvider::new(
            name,
            GoogleMode::ApiKey,
            config.base_url.clone(),
            headers,
        )?),
        ProviderKind::GoogleVertex => {
            let Some(project) = config.project.clone().filter(|p| !p.is_empty()) else {
                return Ok(None);
            };
            let location = config
                .location
                .clone()
                .unwrap_or_else(|| DEFAULT_VERTEX_LOCATION.to_owned());
            Arc::new(GoogleProvider::new(
                name,
                GoogleMode::Vertex { project, location },
                config.base_url.clone(),
                headers,
            )?)
        }
    };

    Ok(Some(provider))
}
