//! Google generative content provider implementation
//!
//! One adapter covers both the Generative Language API (API key) and Vertex AI
//! (project, location and an OAuth access token); only the endpoint and the
//! auth header differ.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use secrecy::ExposeSecret;
use url::Url;

use super::Provider;
use crate::context::RequestContext;
use crate::convert::google::{GoogleStreamState, response_to_internal};
use crate::error::LlmError;
use crate::protocol::google::{GoogleRequest, GoogleResponse};
use crate::types::{AiResponse, AiStream, CompletionParams};

/// Default Generative Language API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Vertex location used when none is configured
pub const DEFAULT_VERTEX_LOCATION: &str = "global";

/// How requests are addressed and authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoogleMode {
    /// Generative Language API with an `x-goog-api-key` header
    ApiKey,
    /// Vertex AI with a bearer access token
    Vertex {
        /// Google Cloud project id
        project: String,
        /// Region, or "global"
        location: String,
    },
}

/// Google generative content provider
pub struct GoogleProvider {
    name: String,
    client: Client,
    base_url: Url,
    mode: GoogleMode,
    headers: HeaderMap,
}

impl GoogleProvider {
    /// Create a provider for `mode`, deriving the base URL when none is given
    ///
    /// # Errors
    ///
    /// Returns `LlmError::InvalidRequest` if a Vertex location produces an
    /// invalid host name.
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded default base URL is invalid (should never happen).
    pub fn new(
        name: impl Into<String>,
        mode: GoogleMode,
        base_url: Option<Url>,
        headers: HeaderMap,
    ) -> Result<Self, LlmError> {
        let base_url = match (base_url, &mode) {
            (Some(url), _) => url,
            (None, GoogleMode::ApiKey) => Url::parse(DEFAULT_BASE_URL).expect("valid default URL"),
            (None, GoogleMode::Vertex { location, .. }) => Url::parse(&vertex_base_url(location))
                .map_err(|e| LlmError::InvalidRequest(format!("invalid Vertex location {location:?}: {e}")))?,
        };

        Ok(Self {
            name: name.into(),
            client: Client::new(),
            base_url,
            mode,
            headers,
        })
    }

    /// Build the endpoint URL for a model and method
    fn endpoint(&self, model: &str, method: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        let model = model.strip_prefix("models/").unwrap_or(model);
        match &self.mode {
            GoogleMode::ApiKey => format!("{base}/models/{model}:{method}"),
            GoogleMode::Vertex { project, location } => {
                format!("{base}/projects/{project}/locations/{location}/publishers/google/models/{model}:{method}")
            }
        }
    }

    fn request(&self, url: String, wire_request: &GoogleRequest, context: &RequestContext) -> reqwest::RequestBuilder {
        let builder = self.client.post(url).headers(self.headers.clone()).json(wire_request);
        match self.mode {
            GoogleMode::ApiKey => builder.header("x-goog-api-key", context.api_key.expose_secret()),
            GoogleMode::Vertex { .. } => builder.bearer_auth(context.api_key.expose_secret()),
        }
    }
}

/// Regional Vertex endpoint; the global location has no region prefix
fn vertex_base_url(location: &str) -> String {
    if location == DEFAULT_VERTEX_LOCATION {
        "https://aiplatform.googleapis.com/v1".to_owned()
    } else {
        format!("https://{location}-aiplatform.googleapis.com/v1")
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, params: &CompletionParams, context: &RequestContext) -> Result<AiResponse, LlmError> {
        let wire_request: GoogleRequest = params.into();
        let url = self.endpoint(&params.model, "generateContent");
        tracing::debug!(provider = %self.name, model = %params.model, "sending completion request");

        let response = super::send(self.request(url, &wire_request, context), &self.name, &context.cancellation).await?;
        let wire_response: GoogleResponse = super::read_json(response, &context.cancellation).await?;

        Ok(response_to_internal(wire_response, &params.model))
    }

    async fn stream(&self, params: &CompletionParams, context: &RequestContext) -> Result<AiStream, LlmError> {
        let wire_request: GoogleRequest = params.into();
        let url = self.endpoint(&params.model, "streamGenerateContent?alt=sse");
        tracing::debug!(provider = %self.name, model = %params.model, "opening completion stream");

        let response = super::send(self.request(url, &wire_request, context), &self.name, &context.cancellation).await?;

        Ok(super::sse_stream(
            response,
            GoogleStreamState::new(),
            context.cancellation.clone(),
        ))
    }
}
