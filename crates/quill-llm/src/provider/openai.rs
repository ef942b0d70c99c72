//! OpenAI-compatible provider implementation
//!
//! Serves `OpenAI` itself as well as `OpenRouter`, `DeepSeek` and xAI, which
//! differ only by base URL and extra headers.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use secrecy::ExposeSecret;
use url::Url;

use super::Provider;
use crate::context::RequestContext;
use crate::convert::openai::OpenAiStreamState;
use crate::error::LlmError;
use crate::protocol::openai::{OpenAiRequest, OpenAiResponse};
use crate::types::{AiResponse, AiStream, CompletionParams};

/// Whether the provider is the canonical `OpenAI` API (vs a compatible third-party)
fn is_canonical_openai(base_url: &Url) -> bool {
    base_url.host_str().is_some_and(|h| h == "api.openai.com")
}

/// OpenAI-compatible provider
pub struct OpenAiProvider {
    name: String,
    client: Client,
    base_url: Url,
    headers: HeaderMap,
}

impl OpenAiProvider {
    /// Create a provider speaking the chat completions protocol at `base_url`
    pub fn new(name: impl Into<String>, base_url: Url, headers: HeaderMap) -> Self {
        Self {
            name: name.into(),
            client: Client::new(),
            base_url,
            headers,
        }
    }

    /// Build the chat completions endpoint URL
    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    /// Translate params, applying vendor-specific field names
    fn wire_request(&self, params: &CompletionParams) -> OpenAiRequest {
        let mut wire_request: OpenAiRequest = params.into();
        // Canonical OpenAI rejects max_tokens on reasoning models
        if is_canonical_openai(&self.base_url) {
            wire_request.max_completion_tokens = wire_request.max_tokens.take();
        }
        wire_request
    }

    fn request(&self, wire_request: &OpenAiRequest, context: &RequestContext) -> reqwest::RequestBuilder {
        self.client
            .post(self.completions_url())
            .headers(self.headers.clone())
            .bearer_auth(context.api_key.expose_secret())
            .json(wire_request)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, params: &CompletionParams, context: &RequestContext) -> Result<AiResponse, LlmError> {
        let wire_request = self.wire_request(params);
        tracing::debug!(provider = %self.name, model = %params.model, "sending completion request");

        let response = super::send(self.request(&wire_request, context), &self.name, &context.cancellation).await?;
        let wire_response: OpenAiResponse = super::read_json(response, &context.cancellation).await?;

        Ok(wire_response.into())
    }

    async fn stream(&self, params: &CompletionParams, context: &RequestContext) -> Result<AiStream, LlmError> {
        let mut wire_request = self.wire_request(params);
        wire_request.stream = Some(true);
        tracing::debug!(provider = %self.name, model = %params.model, "opening completion stream");

        let response = super::send(self.request(&wire_request, context), &self.name, &context.cancellation).await?;

        Ok(super::sse_stream(
            response,
            OpenAiStreamState::new(),
            context.cancellation.clone(),
        ))
    }
}
