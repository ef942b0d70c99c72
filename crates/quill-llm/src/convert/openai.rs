//! Conversion between internal types and the OpenAI-compatible wire format

use std::collections::BTreeMap;

use super::{StreamDecoder, generate_call_id, parse_tool_arguments};
use crate::error::LlmError;
use crate::protocol::openai::{
    OpenAiContent, OpenAiContentPart, OpenAiFunction, OpenAiFunctionCall, OpenAiImageUrl, OpenAiMessage,
    OpenAiRequest, OpenAiResponse, OpenAiStreamChunk, OpenAiTool, OpenAiToolCall,
};
use crate::types::{
    AiResponse, AiStreamChunk, CompletionParams, Content, ContentPart, Effort, FinishReason, Message, Role, ToolCall,
    Usage,
};

/// `reasoning_effort` label; the wire format tops out at "high"
pub const fn reasoning_effort(effort: Effort) -> Option<&'static str> {
    match effort {
        Effort::None => None,
        Effort::Minimal => Some("minimal"),
        Effort::Low => Some("low"),
        Effort::Medium => Some("medium"),
        Effort::High | Effort::Xhigh => Some("high"),
    }
}

/// Map an OpenAI-compatible `finish_reason`; absent means a natural stop
pub fn map_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        None | Some("stop") => FinishReason::Stop,
        Some("length") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        Some("tool_calls" | "function_call") => FinishReason::ToolUse,
        Some(_) => FinishReason::Unknown,
    }
}

// -- Outbound: internal params -> wire request --

impl From<&CompletionParams> for OpenAiRequest {
    fn from(params: &CompletionParams) -> Self {
        let reasoning_effort = reasoning_effort(params.effort).map(str::to_owned);

        let tools = (!params.tools().is_empty()).then(|| {
            params
                .tools()
                .iter()
                .map(|t| OpenAiTool {
                    tool_type: "function".to_owned(),
                    function: OpenAiFunction {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: t.parameters.clone(),
                    },
                })
                .collect()
        });

        Self {
            model: params.model.clone(),
            messages: params.messages.iter().map(internal_message_to_openai).collect(),
            // Reasoning models reject sampling parameters
            temperature: if reasoning_effort.is_some() {
                None
            } else {
                params.temperature
            },
            max_tokens: params.max_tokens,
            max_completion_tokens: None,
            reasoning_effort,
            stream: None,
            tools,
        }
    }
}

/// Convert an internal message to wire format
fn internal_message_to_openai(msg: &Message) -> OpenAiMessage {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    let tool_calls = (!msg.tool_calls().is_empty()).then(|| {
        msg.tool_calls()
            .iter()
            .map(|call| OpenAiToolCall {
                id: call.id.clone(),
                tool_type: "function".to_owned(),
                function: OpenAiFunctionCall {
                    name: call.name.clone(),
                    arguments: call.input.to_string(),
                },
            })
            .collect::<Vec<_>>()
    });

    let content = match content_to_openai(&msg.content) {
        OpenAiContent::Text(text) if text.is_empty() && tool_calls.is_some() => None,
        content => Some(content),
    };

    OpenAiMessage {
        role: role.to_owned(),
        content,
        tool_calls,
        tool_call_id: msg.tool_call_id.clone(),
    }
}

/// Cache hints are stripped; text-only part lists collapse to a string since
/// several compatible vendors only accept string content
fn content_to_openai(content: &Content) -> OpenAiContent {
    match content {
        Content::Text(text) => OpenAiContent::Text(text.clone()),
        Content::Parts(parts) if parts.iter().all(|p| matches!(p, ContentPart::Text { .. })) => {
            OpenAiContent::Text(content.as_text())
        }
        Content::Parts(parts) => OpenAiContent::Parts(
            parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text, .. } => OpenAiContentPart::Text { text: text.clone() },
                    ContentPart::Image { url, .. } => OpenAiContentPart::ImageUrl {
                        image_url: OpenAiImageUrl { url: url.clone() },
                    },
                })
                .collect(),
        ),
    }
}

// -- Response conversion: wire -> internal --

impl From<OpenAiResponse> for AiResponse {
    fn from(resp: OpenAiResponse) -> Self {
        let choice = resp.choices.into_iter().next();

        let (content, reasoning, tool_calls, finish_reason) = match choice {
            Some(choice) => {
                let message = choice.message;
                let reasoning = message
                    .reasoning_content
                    .filter(|r| !r.is_empty())
                    .or(message.reasoning.filter(|r| !r.is_empty()));
                let tool_calls: Vec<ToolCall> = message
                    .tool_calls
                    .unwrap_or_default()
                    .into_iter()
                    .map(|call| {
                        let input = parse_tool_arguments(&call.function.name, &call.function.arguments);
                        ToolCall::new(call.id, call.function.name, input)
                    })
                    .collect();
                (
                    message.content.unwrap_or_default(),
                    reasoning,
                    tool_calls,
                    map_finish_reason(choice.finish_reason.as_deref()),
                )
            }
            None => (String::new(), None, Vec::new(), FinishReason::Unknown),
        };

        Self {
            content,
            reasoning,
            model: resp.model,
            usage: resp.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason,
            tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        }
    }
}

// -- Stream conversion --

#[derive(Debug, Default)]
struct PendingToolCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

/// State tracker for converting OpenAI-compatible stream chunks
///
/// Tool-call fragments are buffered per tool-call index and released when
/// the choice reports a finish reason or the stream ends.
#[derive(Debug, Default)]
pub struct OpenAiStreamState {
    pending_tools: BTreeMap<u32, PendingToolCall>,
    stopped: bool,
}

impl OpenAiStreamState {
    /// Create a new stream state tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert one stream chunk
    pub fn convert_chunk(&mut self, chunk: OpenAiStreamChunk) -> Vec<AiStreamChunk> {
        let mut out = Vec::new();
        if self.stopped {
            return out;
        }

        for choice in chunk.choices {
            let delta = choice.delta;

            let reasoning = delta.reasoning_content.or(delta.reasoning);
            if let Some(text) = reasoning.filter(|r| !r.is_empty()) {
                out.push(AiStreamChunk::Reasoning { text });
            }
            if let Some(text) = delta.content.filter(|c| !c.is_empty()) {
                out.push(AiStreamChunk::Content { text });
            }

            for call in delta.tool_calls.unwrap_or_default() {
                let pending = self.pending_tools.entry(call.index).or_default();
                if let Some(id) = call.id.filter(|id| !id.is_empty()) {
                    pending.id = Some(id);
                }
                if let Some(function) = call.function {
                    if let Some(name) = function.name {
                        pending.name.push_str(&name);
                    }
                    if let Some(arguments) = function.arguments {
                        pending.arguments.push_str(&arguments);
                    }
                }
            }

            if let Some(reason) = choice.finish_reason.as_deref() {
                out.extend(self.flush_tools());
                out.push(AiStreamChunk::Stop {
                    finish_reason: map_finish_reason(Some(reason)),
                });
                self.stopped = true;
                break;
            }
        }

        out
    }

    fn flush_tools(&mut self) -> Vec<AiStreamChunk> {
        std::mem::take(&mut self.pending_tools)
            .into_values()
            .map(|pending| AiStreamChunk::ToolUse {
                input: parse_tool_arguments(&pending.name, &pending.arguments),
                id: pending.id.unwrap_or_else(generate_call_id),
                name: pending.name,
                signature: None,
            })
            .collect()
    }
}

impl StreamDecoder for OpenAiStreamState {
    fn decode(&mut self, data: &str) -> Result<Vec<AiStreamChunk>, LlmError> {
        match serde_json::from_str::<OpenAiStreamChunk>(data) {
            Ok(chunk) => Ok(self.convert_chunk(chunk)),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unparseable OpenAI SSE event");
                Ok(Vec::new())
            }
        }
    }

    fn finish(&mut self) -> Vec<AiStreamChunk> {
        if self.stopped || self.pending_tools.is_empty() {
            return Vec::new();
        }
        self.stopped = true;
        let mut out = self.flush_tools();
        out.push(AiStreamChunk::Stop {
            finish_reason: FinishReason::ToolUse,
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn system_stays_in_place_and_hints_are_stripped() {
        let params = CompletionParams::new(
            "gpt-4.1",
            vec![
                Message::system("Be terse."),
                Message::user(vec![
                    ContentPart::cached_text("<project/>"),
                    ContentPart::text("Go."),
                ]),
                Message::user(vec![
                    ContentPart::text("What is this?"),
                    ContentPart::image("https://example.com/a.png"),
                ]),
            ],
        );
        let value = serde_json::to_value(OpenAiRequest::from(&params)).unwrap();

        assert_eq!(value["messages"][0], json!({"role": "system", "content": "Be terse."}));
        assert_eq!(value["messages"][1]["content"], "<project/>\n\nGo.");
        assert_eq!(
            value["messages"][2]["content"],
            json!([
                {"type": "text", "text": "What is this?"},
                {"type": "image_url", "image_url": {"url": "https://example.com/a.png"}}
            ])
        );
        assert!(!value.to_string().contains("cache"));
    }

    #[test]
    fn tool_turns_roundtrip_to_wire() {
        let params = CompletionParams::new(
            "deepseek-chat",
            vec![
                Message::assistant_tool_calls("", vec![ToolCall::new("call_1", "get_outline", json!({}))]),
                Message::tool_result("call_1", r#"{"success":true}"#),
            ],
        );
        let value = serde_json::to_value(OpenAiRequest::from(&params)).unwrap();

        assert_eq!(value["messages"][0]["content"], serde_json::Value::Null);
        assert_eq!(value["messages"][0]["tool_calls"][0]["function"]["arguments"], "{}");
        assert_eq!(value["messages"][1]["role"], "tool");
        assert_eq!(value["messages"][1]["tool_call_id"], "call_1");
    }

    #[test]
    fn effort_sets_label_and_drops_temperature() {
        let params = CompletionParams::new("o4-mini", vec![Message::user("hi")])
            .with_temperature(Some(0.9))
            .with_effort(Effort::Xhigh);
        let request = OpenAiRequest::from(&params);

        assert_eq!(request.reasoning_effort.as_deref(), Some("high"));
        assert_eq!(request.temperature, None);

        let params = CompletionParams::new("gpt-4.1", vec![Message::user("hi")]).with_temperature(Some(0.9));
        let request = OpenAiRequest::from(&params);
        assert!(request.reasoning_effort.is_none());
        assert_eq!(request.temperature, Some(0.9));
    }


    #[test]
    fn every_effort_reaches_the_wire() {
        let cases = [
            (Effort::Minimal, "minimal"),
            (Effort::Low, "low"),
            (Effort::Medium, "medium"),
            (Effort::High, "high"),
            (Effort::Xhigh, "high"),
        ];

        for (effort, label) in cases {
            let params = CompletionParams::new("o4-mini", vec![Message::user("hi")]).with_effort(effort);
            let wire = serde_json::to_value(OpenAiRequest::from(&params)).unwrap();
            assert_eq!(wire["reasoning_effort"], label, "{effort}");
        }

        let params = CompletionParams::new("o4-mini", vec![Message::user("hi")]);
        let wire = serde_json::to_value(OpenAiRequest::from(&params)).unwrap();
        assert!(wire.get("reasoning_effort").is_none());
    }

    #[test]
    fn response_prefers_reasoning_content() {
        let raw = json!({
            "id": "x",
            "object": "chat.completion",
            "created": 0,
            "model": "deepseek-reasoner",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Yes.", "reasoning_content": "Thinking..."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 3, "completion_tokens": 4, "total_tokens": 7}
        });
        let response: AiResponse = serde_json::from_value::<OpenAiResponse>(raw).unwrap().into();

        assert_eq!(response.content, "Yes.");
        assert_eq!(response.reasoning.as_deref(), Some("Thinking..."));
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.unwrap().total_tokens, 7);
        assert!(response.tool_calls.is_none());
    }

    #[test]
    fn response_tool_calls_are_parsed() {
        let raw = json!({
            "model": "gpt-4.1",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{"id": "call_9", "type": "function", "function": {"name": "get_character", "arguments": "{\"id\":\"c1\"}"}}]
                },
                "finish_reason": "tool_calls"
            }]
        });
        let response: AiResponse = serde_json::from_value::<OpenAiResponse>(raw).unwrap().into();

        assert_eq!(response.finish_reason, FinishReason::ToolUse);
        assert_eq!(response.tool_calls()[0], ToolCall::new("call_9", "get_character", json!({"id": "c1"})));
    }

    #[test]
    fn finish_reason_mapping() {
        assert_eq!(map_finish_reason(Some("stop")), FinishReason::Stop);
        assert_eq!(map_finish_reason(Some("length")), FinishReason::Length);
        assert_eq!(map_finish_reason(Some("content_filter")), FinishReason::ContentFilter);
        assert_eq!(map_finish_reason(Some("tool_calls")), FinishReason::ToolUse);
        assert_eq!(map_finish_reason(Some("function_call")), FinishReason::ToolUse);
        assert_eq!(map_finish_reason(Some("insufficient_system_resource")), FinishReason::Unknown);
        assert_eq!(map_finish_reason(None), FinishReason::Stop);
    }

    fn decode_all(state: &mut OpenAiStreamState, events: &[serde_json::Value]) -> Vec<AiStreamChunk> {
        let mut chunks = Vec::new();
        for event in events {
            chunks.extend(state.decode(&event.to_string()).unwrap());
        }
        chunks.extend(state.finish());
        chunks
    }

    #[test]
    fn stream_reassembles_tool_calls_by_index() {
        let mut state = OpenAiStreamState::new();
        let chunks = decode_all(
            &mut state,
            &[
                json!({"choices": [{"index": 0, "delta": {"role": "assistant", "reasoning": "Plan."}}]}),
                json!({"choices": [{"index": 0, "delta": {"tool_calls": [
                    {"index": 0, "id": "call_a", "type": "function", "function": {"name": "get_character", "arguments": ""}},
                ]}}]}),
                json!({"choices": [{"index": 0, "delta": {"tool_calls": [
                    {"index": 1, "id": "call_b", "type": "function", "function": {"name": "get_location", "arguments": "{\"id\":"}},
                ]}}]}),
                json!({"choices": [{"index": 0, "delta": {"tool_calls": [
                    {"index": 0, "function": {"arguments": "{\"id\":\"c1\"}"}},
                    {"index": 1, "function": {"arguments": "\"l1\"}"}}
                ]}}]}),
                json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "tool_calls"}]}),
                json!({"choices": [], "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}}),
            ],
        );

        assert_eq!(
            chunks,
            vec![
                AiStreamChunk::Reasoning {
                    text: "Plan.".to_owned()
                },
                AiStreamChunk::ToolUse {
                    id: "call_a".to_owned(),
                    name: "get_character".to_owned(),
                    input: json!({"id": "c1"}),
                    signature: None,
                },
                AiStreamChunk::ToolUse {
                    id: "call_b".to_owned(),
                    name: "get_location".to_owned(),
                    input: json!({"id": "l1"}),
                    signature: None,
                },
                AiStreamChunk::Stop {
                    finish_reason: FinishReason::ToolUse
                },
            ]
        );
    }

    #[test]
    fn stream_flushes_tools_when_finish_reason_is_missing() {
        let mut state = OpenAiStreamState::new();
        let chunks = decode_all(
            &mut state,
            &[json!({"choices": [{"index": 0, "delta": {"tool_calls": [
                {"index": 0, "function": {"name": "get_outline", "arguments": "{}"}}
            ]}}]})],
        );

        assert_eq!(chunks.len(), 2);
        assert!(matches!(&chunks[0], AiStreamChunk::ToolUse { id, .. } if id.starts_with("call_")));
        assert_eq!(
            chunks[1],
            AiStreamChunk::Stop {
                finish_reason: FinishReason::ToolUse
            }
        );
    }

    #[test]
    fn stream_text_then_stop() {
        let mut state = OpenAiStreamState::new();
        let chunks = decode_all(
            &mut state,
            &[
                json!({"choices": [{"index": 0, "delta": {"content": "Rain "}}]}),
                json!({"choices": [{"index": 0, "delta": {"content": "fell."}}]}),
                json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "length"}]}),
                json!({"choices": [{"index": 0, "delta": {"content": "ignored"}}]}),
            ],
        );

        assert_eq!(
            chunks,
            vec![
                AiStreamChunk::Content {
                    text: "Rain ".to_owned()
                },
                AiStreamChunk::Content {
                    text: "fell.".to_owned()
                },
                AiStreamChunk::Stop {
                    finish_reason: FinishReason::Length
                },
            ]
        );
    }
}
