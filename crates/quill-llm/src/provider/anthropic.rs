//! Anthropic Messages API provider implementation

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use secrecy::ExposeSecret;
use url::Url;

use super::Provider;
use crate::context::RequestContext;
use crate::convert::anthropic::AnthropicStreamState;
use crate::error::LlmError;
use crate::protocol::anthropic::{AnthropicRequest, AnthropicResponse};
use crate::types::{AiResponse, AiStream, CompletionParams};

/// Default Anthropic API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    name: String,
    client: Client,
    base_url: Url,
    headers: HeaderMap,
}

impl AnthropicProvider {
    /// Create a provider, falling back to the public API when no base URL is given
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded default base URL is invalid (should never happen).
    pub fn new(name: impl Into<String>, base_url: Option<Url>, headers: HeaderMap) -> Self {
        let base_url = base_url.unwrap_or_else(|| Url::parse(DEFAULT_BASE_URL).expect("valid default URL"));

        Self {
            name: name.into(),
            client: Client::new(),
            base_url,
            headers,
        }
    }

    /// Build the messages endpoint URL
    fn messages_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/messages")
    }

    fn request(&self, wire_request: &AnthropicRequest, context: &RequestContext) -> reqwest::RequestBuilder {
        self.client
            .post(self.messages_url())
            .headers(self.headers.clone())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("x-api-key", context.api_key.expose_secret())
            .json(wire_request)
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, params: &CompletionParams, context: &RequestContext) -> Result<AiResponse, LlmError> {
        let wire_request: AnthropicRequest = params.into();
        tracing::debug!(provider = %self.name, model = %params.model, "sending completion request");

        let response = super::send(self.request(&wire_request, context), &self.name, &context.cancellation).await?;
        let wire_response: AnthropicResponse = super::read_json(response, &context.cancellation).await?;

        Ok(wire_response.into())
    }

    async fn stream(&self, params: &CompletionParams, context: &RequestContext) -> Result<AiStream, LlmError> {
        let mut wire_request: AnthropicRequest = params.into();
        wire_request.stream = Some(true);
        tracing::debug!(provider = %self.name, model = %params.model, "opening completion stream");

        let response = super::send(self.request(&wire_request, context), &self.name, &context.cancellation).await?;

        Ok(super::sse_stream(
            response,
            AnthropicStreamState::new(),
            context.cancellation.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::types::{AiStreamChunk, ContentPart, FinishReason, Message};

    fn provider(server: &MockServer) -> AnthropicProvider {
        let base_url = Url::parse(&format!("{}/v1", server.uri())).unwrap();
        AnthropicProvider::new("anthropic", Some(base_url), HeaderMap::new())
    }

    fn sse(events: &[(&str, serde_json::Value)]) -> String {
        events
            .iter()
            .map(|(name, data)| format!("event: {name}\ndata: {data}\n\n"))
            .collect()
    }

    #[tokio::test]
    async fn complete_sends_auth_headers_and_cache_control() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "system": [{"type": "text", "text": "Project context", "cache_control": {"type": "ephemeral"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "model": "claude-sonnet-4-5",
                "content": [{"type": "text", "text": "Rain fell on the harbour."}],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 30, "output_tokens": 7}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let params = CompletionParams::new(
            "claude-sonnet-4-5",
            vec![
                Message::system(vec![ContentPart::cached_text("Project context")]),
                Message::user("Describe the harbour"),
            ],
        );
        let response = provider(&server)
            .complete(&params, &RequestContext::new("sk-ant-test"))
            .await
            .unwrap();

        assert_eq!(response.content, "Rain fell on the harbour.");
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[tokio::test]
    async fn stream_buffers_tool_input_until_block_stop() {
        let server = MockServer::start().await;
        let body = sse(&[
            (
                "message_start",
                json!({"type": "message_start", "message": {"id": "msg_1", "model": "claude-sonnet-4-5"}}),
            ),
            (
                "content_block_start",
                json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
            ),
            (
                "content_block_delta",
                json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Looking her up."}}),
            ),
            ("content_block_stop", json!({"type": "content_block_stop", "index": 0})),
            (
                "content_block_start",
                json!({"type": "content_block_start", "index": 1, "content_block": {"type": "tool_use", "id": "toolu_1", "name": "get_character", "input": {}}}),
            ),
            (
                "content_block_delta",
                json!({"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": "{\"id\": "}}),
            ),
            (
                "content_block_delta",
                json!({"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": "\"c1\"}"}}),
            ),
            ("content_block_stop", json!({"type": "content_block_stop", "index": 1})),
            (
                "message_delta",
                json!({"type": "message_delta", "delta": {"stop_reason": "tool_use"}, "usage": {"output_tokens": 20}}),
            ),
            ("message_stop", json!({"type": "message_stop"})),
        ]);
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let params = CompletionParams::new("claude-sonnet-4-5", vec![Message::user("Who is Mara?")]);
        let chunks: Vec<_> = provider(&server)
            .stream(&params, &RequestContext::new("k"))
            .await
            .unwrap()
            .map(Result::unwrap)
            .collect()
            .await;

        assert_eq!(
            chunks,
            vec![
                AiStreamChunk::Content {
                    text: "Looking her up.".to_owned()
                },
                AiStreamChunk::ToolUse {
                    id: "toolu_1".to_owned(),
                    name: "get_character".to_owned(),
                    input: json!({"id": "c1"}),
                    signature: None,
                },
                AiStreamChunk::Stop {
                    finish_reason: FinishReason::ToolUse
                },
            ]
        );
    }

    #[tokio::test]
    async fn stream_error_event_fails_stream() {
        let server = MockServer::start().await;
        let body = sse(&[(
            "error",
            json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}),
        )]);
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let params = CompletionParams::new("claude-sonnet-4-5", vec![Message::user("hi")]);
        let results: Vec<_> = provider(&server)
            .stream(&params, &RequestContext::new("k"))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(results.len(), 1);
        assert!(matches!(&results[0], Err(LlmError::Streaming(msg)) if msg.contains("overloaded_error")));
    }
}
