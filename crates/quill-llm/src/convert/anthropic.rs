//! Conversion between internal types and Anthropic wire format

use std::collections::BTreeMap;

use super::{StreamDecoder, parse_data_url, parse_tool_arguments};
use crate::error::LlmError;
use crate::protocol::anthropic::{
    AnthropicCacheControl, AnthropicContent, AnthropicContentBlock, AnthropicImageSource, AnthropicMessage,
    AnthropicOutputConfig, AnthropicRequest, AnthropicResponse, AnthropicResponseBlock, AnthropicStreamContentBlock,
    AnthropicStreamDelta, AnthropicStreamEvent, AnthropicSystemBlock, AnthropicThinking, AnthropicTool,
};
use crate::types::{
    AiResponse, AiStreamChunk, CacheHint, CompletionParams, Content, ContentPart, Effort, FinishReason, Message, Role,
    ToolCall, Usage,
};

/// Default max tokens when not specified (Anthropic requires this field)
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Thinking budget in tokens for fixed-budget models
pub const fn thinking_budget(effort: Effort) -> Option<u32> {
    match effort {
        Effort::None => None,
        Effort::Minimal => Some(1024),
        Effort::Low => Some(4096),
        Effort::Medium => Some(10_000),
        Effort::High => Some(24_000),
        Effort::Xhigh => Some(32_000),
    }
}

/// Whether the model takes `thinking: adaptive` instead of a fixed budget
///
/// True for Claude Opus and Sonnet 4.6 and every later generation.
pub fn supports_adaptive_thinking(model: &str) -> bool {
    let model = model.rsplit('/').next().unwrap_or(model);
    let Some(rest) = model.strip_prefix("claude-") else {
        return false;
    };
    let Some(version) = rest.strip_prefix("opus-").or_else(|| rest.strip_prefix("sonnet-")) else {
        return false;
    };

    let mut numbers = version.split(['-', '.']).map_while(|s| s.parse::<u32>().ok());
    let major = numbers.next().unwrap_or(0);
    // Date suffixes ("claude-opus-4-20250514") are not minor versions
    let minor = numbers.next().filter(|minor| *minor < 100).unwrap_or(0);

    major > 4 || (major == 4 && minor >= 6)
}

/// Map an Anthropic `stop_reason`; absent means a natural stop
pub fn map_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        None | Some("end_turn" | "stop_sequence") => FinishReason::Stop,
        Some("max_tokens") => FinishReason::Length,
        Some("tool_use") => FinishReason::ToolUse,
        Some("refusal") => FinishReason::ContentFilter,
        Some(_) => FinishReason::Unknown,
    }
}

// -- Outbound: internal params -> Anthropic wire request --

impl From<&CompletionParams> for AnthropicRequest {
    fn from(params: &CompletionParams) -> Self {
        let (system, messages) = convert_messages(&params.messages);
        let max_tokens = params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);

        // A follow-up after tool results would need the signed thinking block of
        // the previous assistant turn, which the message model does not carry
        let mid_tool_loop = params.messages.last().is_some_and(|m| m.role == Role::Tool);
        let effort = if mid_tool_loop && params.effort.is_enabled() {
            tracing::debug!(model = %params.model, "thinking disabled for tool-result follow-up");
            Effort::None
        } else {
            params.effort
        };

        let mut request = Self {
            model: params.model.clone(),
            max_tokens,
            system,
            messages,
            temperature: params.temperature,
            thinking: None,
            output_config: None,
            stream: None,
            tools: (!params.tools().is_empty()).then(|| {
                params
                    .tools()
                    .iter()
                    .map(|t| AnthropicTool {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        input_schema: t.parameters.clone(),
                    })
                    .collect()
            }),
        };

        if supports_adaptive_thinking(&params.model) {
            if let Some(label) = effort.adaptive() {
                request.thinking = Some(AnthropicThinking::Adaptive);
                request.output_config = Some(AnthropicOutputConfig {
                    effort: label.to_string(),
                });
                request.temperature = None;
            }
        } else if let Some(budget) = thinking_budget(effort) {
            request.thinking = Some(AnthropicThinking::Enabled { budget_tokens: budget });
            request.max_tokens = max_tokens.saturating_add(budget);
            request.temperature = None;
        }

        request
    }
}

/// Split system messages out and convert the rest
///
/// Consecutive tool results are merged into one user turn, as Anthropic
/// requires all results for an assistant turn to arrive together.
fn convert_messages(messages: &[Message]) -> (Vec<AnthropicSystemBlock>, Vec<AnthropicMessage>) {
    let mut system = Vec::new();
    let mut converted: Vec<AnthropicMessage> = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => system.extend(system_blocks(&msg.content)),
            Role::Tool => {
                let Some(tool_use_id) = msg.tool_call_id.clone() else {
                    tracing::warn!("dropping tool message without tool_call_id");
                    continue;
                };
                let block = AnthropicContentBlock::ToolResult {
                    tool_use_id,
                    content: msg.content.as_text(),
                };
                if let Some(blocks) = trailing_tool_results(&mut converted) {
                    blocks.push(block);
                } else {
                    converted.push(AnthropicMessage {
                        role: "user".to_owned(),
                        content: AnthropicContent::Blocks(vec![block]),
                    });
                }
            }
            Role::User => converted.push(AnthropicMessage {
                role: "user".to_owned(),
                content: content_to_anthropic(&msg.content),
            }),
            Role::Assistant => converted.push(assistant_message(msg)),
        }
    }

    (system, converted)
}

/// Blocks of the last message when it is a user turn made only of tool results
fn trailing_tool_results(messages: &mut [AnthropicMessage]) -> Option<&mut Vec<AnthropicContentBlock>> {
    match messages.last_mut()? {
        AnthropicMessage {
            role,
            content: AnthropicContent::Blocks(blocks),
        } if role == "user"
            && blocks
                .iter()
                .all(|block| matches!(block, AnthropicContentBlock::ToolResult { .. })) =>
        {
            Some(blocks)
        }
        _ => None,
    }
}

fn system_blocks(content: &Content) -> Vec<AnthropicSystemBlock> {
    let block = |text: &str, cache_hint: Option<CacheHint>| AnthropicSystemBlock {
        block_type: "text".to_owned(),
        text: text.to_owned(),
        cache_control: cache_hint.map(|_| AnthropicCacheControl::ephemeral()),
    };

    match content {
        Content::Text(text) if text.is_empty() => Vec::new(),
        Content::Text(text) => vec![block(text, None)],
        Content::Parts(parts) => parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text, cache_hint } if !text.is_empty() => Some(block(text, *cache_hint)),
                ContentPart::Text { .. } => None,
                ContentPart::Image { .. } => {
                    tracing::debug!("dropping image part from system message");
                    None
                }
            })
            .collect(),
    }
}

fn assistant_message(msg: &Message) -> AnthropicMessage {
    if msg.tool_calls().is_empty() {
        return AnthropicMessage {
            role: "assistant".to_owned(),
            content: content_to_anthropic(&msg.content),
        };
    }

    let mut blocks = match content_to_anthropic(&msg.content) {
        AnthropicContent::Text(text) if text.is_empty() => Vec::new(),
        AnthropicContent::Text(text) => vec![AnthropicContentBlock::Text {
            text,
            cache_control: None,
        }],
        AnthropicContent::Blocks(blocks) => blocks,
    };
    blocks.extend(msg.tool_calls().iter().map(|call| AnthropicContentBlock::ToolUse {
        id: call.id.clone(),
        name: call.name.clone(),
        input: call.input.clone(),
    }));

    AnthropicMessage {
        role: "assistant".to_owned(),
        content: AnthropicContent::Blocks(blocks),
    }
}

fn content_to_anthropic(content: &Content) -> AnthropicContent {
    match content {
        Content::Text(text) => AnthropicContent::Text(text.clone()),
        Content::Parts(parts) => AnthropicContent::Blocks(
            parts
                .iter()
                .filter_map(|part| match part {
                    // Anthropic rejects empty text blocks
                    ContentPart::Text { text, .. } if text.is_empty() => None,
                    ContentPart::Text { text, cache_hint } => Some(AnthropicContentBlock::Text {
                        text: text.clone(),
                        cache_control: cache_hint.map(|_| AnthropicCacheControl::ephemeral()),
                    }),
                    ContentPart::Image { url, cache_hint } => Some(AnthropicContentBlock::Image {
                        source: image_source(url),
                        cache_control: cache_hint.map(|_| AnthropicCacheControl::ephemeral()),
                    }),
                })
                .collect(),
        ),
    }
}

fn image_source(url: &str) -> AnthropicImageSource {
    match parse_data_url(url) {
        Some(image) => AnthropicImageSource::Base64 {
            media_type: image.mime_type,
            data: image.data,
        },
        None => AnthropicImageSource::Url { url: url.to_owned() },
    }
}

// -- Response conversion: Anthropic -> internal --

impl From<AnthropicResponse> for AiResponse {
    fn from(resp: AnthropicResponse) -> Self {
        let mut content = String::new();
        let mut reasoning = String::new();
        let mut tool_calls = Vec::new();

        for block in resp.content {
            match block {
                AnthropicResponseBlock::Text { text } => content.push_str(&text),
                AnthropicResponseBlock::Thinking { thinking } => reasoning.push_str(&thinking),
                AnthropicResponseBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall::new(id, name, input)),
                AnthropicResponseBlock::Other => {}
            }
        }

        Self {
            content,
            reasoning: (!reasoning.is_empty()).then_some(reasoning),
            model: resp.model,
            usage: resp.usage.map(|u| Usage::new(u.input_tokens, u.output_tokens)),
            finish_reason: map_finish_reason(resp.stop_reason.as_deref()),
            tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        }
    }
}

// -- Stream conversion --

/// Tool-use block whose input JSON is still arriving
#[derive(Debug)]
struct PendingToolUse {
    id: String,
    name: String,
    json: String,
}

impl PendingToolUse {
    fn into_chunk(self) -> AiStreamChunk {
        AiStreamChunk::ToolUse {
            input: parse_tool_arguments(&self.name, &self.json),
            id: self.id,
            name: self.name,
            signature: None,
        }
    }
}

/// State tracker for converting Anthropic stream events
///
/// Tool input fragments are buffered per content-block index and released
/// as one `ToolUse` chunk when their block stops.
#[derive(Debug, Default)]
pub struct AnthropicStreamState {
    pending_tools: BTreeMap<u32, PendingToolUse>,
    finish_reason: Option<FinishReason>,
    stopped: bool,
}

impl AnthropicStreamState {
    /// Create a new stream state tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert one Anthropic stream event to chunks
    pub fn convert_event(&mut self, event: AnthropicStreamEvent) -> Result<Vec<AiStreamChunk>, LlmError> {
        if self.stopped {
            return Ok(Vec::new());
        }

        let chunks = match event {
            AnthropicStreamEvent::MessageStart { .. } | AnthropicStreamEvent::Ping => Vec::new(),

            AnthropicStreamEvent::ContentBlockStart { index, content_block } => match content_block {
                AnthropicStreamContentBlock::Text { text } if !text.is_empty() => {
                    vec![AiStreamChunk::Content { text }]
                }
                AnthropicStreamContentBlock::Thinking { thinking } if !thinking.is_empty() => {
                    vec![AiStreamChunk::Reasoning { text: thinking }]
                }
                AnthropicStreamContentBlock::ToolUse { id, name } => {
                    self.pending_tools.insert(
                        index,
                        PendingToolUse {
                            id,
                            name,
                            json: String::new(),
                        },
                    );
                    Vec::new()
                }
                _ => Vec::new(),
            },

            AnthropicStreamEvent::ContentBlockDelta { index, delta } => match delta {
                AnthropicStreamDelta::TextDelta { text } if !text.is_empty() => vec![AiStreamChunk::Content { text }],
                AnthropicStreamDelta::ThinkingDelta { thinking } if !thinking.is_empty() => {
                    vec![AiStreamChunk::Reasoning { text: thinking }]
                }
                AnthropicStreamDelta::InputJsonDelta { partial_json } => {
                    match self.pending_tools.get_mut(&index) {
                        Some(pending) => pending.json.push_str(&partial_json),
                        None => tracing::debug!(index, "input_json_delta for unknown content block"),
                    }
                    Vec::new()
                }
                _ => Vec::new(),
            },

            AnthropicStreamEvent::ContentBlockStop { index } => self
                .pending_tools
                .remove(&index)
                .map(PendingToolUse::into_chunk)
                .into_iter()
                .collect(),

            AnthropicStreamEvent::MessageDelta { delta } => {
                if let Some(reason) = delta.stop_reason.as_deref() {
                    self.finish_reason = Some(map_finish_reason(Some(reason)));
                }
                Vec::new()
            }

            AnthropicStreamEvent::MessageStop => self.stop(),

            AnthropicStreamEvent::Error { error } => {
                return Err(LlmError::Streaming(format!("{}: {}", error.error_type, error.message)));
            }
        };

        Ok(chunks)
    }

    /// Flush unfinished tool blocks and emit the terminal chunk
    fn stop(&mut self) -> Vec<AiStreamChunk> {
        self.stopped = true;
        let mut chunks: Vec<_> = std::mem::take(&mut self.pending_tools)
            .into_values()
            .map(PendingToolUse::into_chunk)
            .collect();
        chunks.push(AiStreamChunk::Stop {
            finish_reason: self.finish_reason.unwrap_or(FinishReason::Stop),
        });
        chunks
    }
}

impl StreamDecoder for AnthropicStreamState {
    fn decode(&mut self, data: &str) -> Result<Vec<AiStreamChunk>, LlmError> {
        match serde_json::from_str::<AnthropicStreamEvent>(data) {
            Ok(event) => self.convert_event(event),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unparseable Anthropic SSE event");
                Ok(Vec::new())
            }
        }
    }

    fn finish(&mut self) -> Vec<AiStreamChunk> {
        if self.stopped || (self.pending_tools.is_empty() && self.finish_reason.is_none()) {
            return Vec::new();
        }
        self.stop()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::ToolDescriptor;

    fn params(model: &str, messages: Vec<Message>) -> CompletionParams {
        CompletionParams::new(model, messages)
    }

    #[test]
    fn system_blocks_keep_cache_hints() {
        let request: AnthropicRequest = (&params(
            "claude-sonnet-4-5",
            vec![
                Message::system("You are a writing assistant."),
                Message::user(vec![
                    ContentPart::cached_text("<project>…</project>"),
                    ContentPart::text("Continue the scene."),
                ]),
            ],
        ))
            .into();

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value["system"],
            json!([{"type": "text", "text": "You are a writing assistant."}])
        );
        assert_eq!(value["messages"][0]["content"][0]["cache_control"], json!({"type": "ephemeral"}));
        assert!(value["messages"][0]["content"][1].get("cache_control").is_none());
        assert_eq!(value["max_tokens"], 4096);
    }

    #[test]
    fn images_become_base64_or_url_sources() {
        let request: AnthropicRequest = (&params(
            "claude-sonnet-4-5",
            vec![Message::user(vec![
                ContentPart::image("data:image/jpeg;base64,/9j/4AAQ"),
                ContentPart::image("https://example.com/map.png"),
            ])],
        ))
            .into();

        let value = serde_json::to_value(&request).unwrap();
        let content = &value["messages"][0]["content"];
        assert_eq!(
            content[0]["source"],
            json!({"type": "base64", "media_type": "image/jpeg", "data": "/9j/4AAQ"})
        );
        assert_eq!(
            content[1]["source"],
            json!({"type": "url", "url": "https://example.com/map.png"})
        );
    }

    #[test]
    fn fixed_budget_thinking_raises_max_tokens_and_drops_temperature() {
        let request: AnthropicRequest = (&params("claude-sonnet-4-5", vec![Message::user("hi")])
            .with_max_tokens(Some(2000))
            .with_temperature(Some(0.7))
            .with_effort(Effort::Medium))
            .into();

        assert_eq!(request.thinking, Some(AnthropicThinking::Enabled { budget_tokens: 10_000 }));
        assert_eq!(request.max_tokens, 12_000);
        assert_eq!(request.temperature, None);
        assert!(request.output_config.is_none());
    }

    #[test]
    fn adaptive_models_get_effort_label() {
        let request: AnthropicRequest = (&params("claude-opus-4-6", vec![Message::user("hi")])
            .with_temperature(Some(0.7))
            .with_effort(Effort::Xhigh))
            .into();

        assert_eq!(request.thinking, Some(AnthropicThinking::Adaptive));
        assert_eq!(request.output_config.unwrap().effort, "max");
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(request.temperature, None);
    }


    #[test]
    fn every_effort_reaches_the_wire() {
        let cases = [
            (Effort::Minimal, 1024, "low"),
            (Effort::Low, 4096, "low"),
            (Effort::Medium, 10_000, "medium"),
            (Effort::High, 24_000, "high"),
            (Effort::Xhigh, 32_000, "max"),
        ];

        for (effort, budget, label) in cases {
            let fixed: AnthropicRequest = (&params("claude-sonnet-4-5", vec![Message::user("hi")])
                .with_max_tokens(Some(2000))
                .with_effort(effort))
                .into();
            let wire = serde_json::to_value(&fixed).unwrap();
            assert_eq!(wire["thinking"], json!({"type": "enabled", "budget_tokens": budget}), "{effort}");
            assert_eq!(wire["max_tokens"], 2000 + budget, "{effort}");
            assert!(wire.get("output_config").is_none(), "{effort}");

            let adaptive: AnthropicRequest =
                (&params("claude-opus-4-6", vec![Message::user("hi")]).with_effort(effort)).into();
            let wire = serde_json::to_value(&adaptive).unwrap();
            assert_eq!(wire["thinking"], json!({"type": "adaptive"}), "{effort}");
            assert_eq!(wire["output_config"], json!({"effort": label}), "{effort}");
            assert_eq!(wire["max_tokens"], DEFAULT_MAX_TOKENS, "{effort}");
        }
    }

    #[test]
    fn no_effort_passes_temperature_through() {
        let request: AnthropicRequest = (&params("claude-opus-4-6", vec![Message::user("hi")])
            .with_temperature(Some(0.4)))
            .into();

        assert!(request.thinking.is_none());
        assert_eq!(request.temperature, Some(0.4));
    }

    #[test]
    fn adaptive_model_detection() {
        assert!(supports_adaptive_thinking("claude-opus-4-6"));
        assert!(supports_adaptive_thinking("claude-sonnet-4-6-20260201"));
        assert!(supports_adaptive_thinking("claude-opus-5"));
        assert!(!supports_adaptive_thinking("claude-sonnet-4-5"));
        assert!(!supports_adaptive_thinking("claude-opus-4-20250514"));
        assert!(!supports_adaptive_thinking("claude-haiku-4-5"));
        assert!(!supports_adaptive_thinking("claude-3-7-sonnet-latest"));
    }

    #[test]
    fn tool_results_merge_into_one_user_turn() {
        let messages = vec![
            Message::user("Who is in chapter one?"),
            Message::assistant_tool_calls(
                "",
                vec![
                    ToolCall::new("toolu_1", "list_characters", json!({})),
                    ToolCall::new("toolu_2", "get_chapter", json!({"id": "ch1"})),
                ],
            ),
            Message::tool_result("toolu_1", r#"{"success":true}"#),
            Message::tool_result("toolu_2", r#"{"success":false}"#),
        ];
        let request: AnthropicRequest = (&params("claude-sonnet-4-5", messages).with_effort(Effort::High)).into();

        assert_eq!(request.messages.len(), 3);
        let value = serde_json::to_value(&request.messages).unwrap();
        assert_eq!(value[1]["content"].as_array().unwrap().len(), 2);
        assert_eq!(value[1]["content"][0]["type"], "tool_use");
        assert_eq!(value[2]["role"], "user");
        assert_eq!(value[2]["content"][1]["tool_use_id"], "toolu_2");
        // Thinking is not sent mid tool loop
        assert!(request.thinking.is_none());
    }

    #[test]
    fn tools_are_forwarded_with_input_schema() {
        let request: AnthropicRequest = (&params("claude-sonnet-4-5", vec![Message::user("hi")]).with_tools(vec![
            ToolDescriptor {
                name: "get_outline".to_owned(),
                description: "Read the outline".to_owned(),
                parameters: json!({"type": "object", "properties": {}}),
            },
        ]))
            .into();

        let tools = request.tools.unwrap();
        assert_eq!(tools[0].name, "get_outline");
        assert_eq!(tools[0].input_schema["type"], "object");
    }

    #[test]
    fn response_collects_text_thinking_and_tools() {
        let raw = json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-sonnet-4-5",
            "content": [
                {"type": "thinking", "thinking": "Let me check.", "signature": "sig"},
                {"type": "text", "text": "Looking it up."},
                {"type": "tool_use", "id": "toolu_1", "name": "get_character", "input": {"id": "c1"}},
                {"type": "redacted_thinking", "data": "xyz"}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        });
        let response: AiResponse = serde_json::from_value::<AnthropicResponse>(raw).unwrap().into();

        assert_eq!(response.content, "Looking it up.");
        assert_eq!(response.reasoning.as_deref(), Some("Let me check."));
        assert_eq!(response.finish_reason, FinishReason::ToolUse);
        assert_eq!(response.tool_calls()[0].input, json!({"id": "c1"}));
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn finish_reason_mapping() {
        assert_eq!(map_finish_reason(Some("end_turn")), FinishReason::Stop);
        assert_eq!(map_finish_reason(Some("stop_sequence")), FinishReason::Stop);
        assert_eq!(map_finish_reason(Some("max_tokens")), FinishReason::Length);
        assert_eq!(map_finish_reason(Some("tool_use")), FinishReason::ToolUse);
        assert_eq!(map_finish_reason(Some("refusal")), FinishReason::ContentFilter);
        assert_eq!(map_finish_reason(Some("pause_turn")), FinishReason::Unknown);
        assert_eq!(map_finish_reason(None), FinishReason::Stop);
    }

    fn decode_all(events: &[serde_json::Value]) -> Vec<AiStreamChunk> {
        let mut state = AnthropicStreamState::new();
        let mut chunks = Vec::new();
        for event in events {
            chunks.extend(state.decode(&event.to_string()).unwrap());
        }
        chunks.extend(state.finish());
        chunks
    }

    #[test]
    fn stream_buffers_tool_input_until_block_stop() {
        let chunks = decode_all(&[
            json!({"type": "message_start", "message": {"id": "msg_1", "model": "claude-sonnet-4-5"}}),
            json!({"type": "content_block_start", "index": 0, "content_block": {"type": "thinking", "thinking": ""}}),
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "thinking_delta", "thinking": "Hmm."}}),
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "signature_delta", "signature": "s"}}),
            json!({"type": "content_block_stop", "index": 0}),
            json!({"type": "content_block_start", "index": 1, "content_block": {"type": "text", "text": ""}}),
            json!({"type": "content_block_delta", "index": 1, "delta": {"type": "text_delta", "text": "Adding her."}}),
            json!({"type": "content_block_stop", "index": 1}),
            json!({"type": "content_block_start", "index": 2, "content_block": {"type": "tool_use", "id": "toolu_1", "name": "create_character", "input": {}}}),
            json!({"type": "content_block_delta", "index": 2, "delta": {"type": "input_json_delta", "partial_json": "{\"na"}}),
            json!({"type": "ping"}),
            json!({"type": "content_block_delta", "index": 2, "delta": {"type": "input_json_delta", "partial_json": "me\": \"Mara\"}"}}),
            json!({"type": "content_block_stop", "index": 2}),
            json!({"type": "message_delta", "delta": {"stop_reason": "tool_use"}, "usage": {"output_tokens": 40}}),
            json!({"type": "message_stop"}),
        ]);

        assert_eq!(
            chunks,
            vec![
                AiStreamChunk::Reasoning { text: "Hmm.".to_owned() },
                AiStreamChunk::Content {
                    text: "Adding her.".to_owned()
                },
                AiStreamChunk::ToolUse {
                    id: "toolu_1".to_owned(),
                    name: "create_character".to_owned(),
                    input: json!({"name": "Mara"}),
                    signature: None,
                },
                AiStreamChunk::Stop {
                    finish_reason: FinishReason::ToolUse
                },
            ]
        );
    }

    #[test]
    fn stream_malformed_tool_json_degrades_to_empty_object() {
        let chunks = decode_all(&[
            json!({"type": "content_block_start", "index": 0, "content_block": {"type": "tool_use", "id": "toolu_1", "name": "get_outline", "input": {}}}),
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "input_json_delta", "partial_json": "{\"broken"}}),
            json!({"type": "content_block_stop", "index": 0}),
            json!({"type": "message_stop"}),
        ]);

        assert!(matches!(&chunks[0], AiStreamChunk::ToolUse { input, .. } if *input == json!({})));
        assert_eq!(
            chunks[1],
            AiStreamChunk::Stop {
                finish_reason: FinishReason::Stop
            }
        );
    }

    #[test]
    fn stream_error_event_fails() {
        let mut state = AnthropicStreamState::new();
        let err = state
            .decode(r#"{"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}"#)
            .unwrap_err();
        assert!(matches!(err, LlmError::Streaming(msg) if msg.contains("Overloaded")));
    }

    #[test]
    fn stream_ignores_unknown_events_and_garbage() {
        let mut state = AnthropicStreamState::new();
        assert!(state.decode(r#"{"type": "brand_new_event"}"#).unwrap().is_empty());
        assert!(state.decode("not json").unwrap().is_empty());
        assert!(state.finish().is_empty());
    }
}
