//! Conversion between internal types and Google generative content format

use std::collections::HashMap;

use super::{StreamDecoder, generate_call_id, parse_data_url};
use crate::error::LlmError;
use crate::protocol::google::{
    GoogleContent, GoogleFunctionCall, GoogleFunctionDeclaration, GoogleFunctionResponse, GoogleGenerationConfig,
    GoogleInlineData, GooglePart, GoogleRequest, GoogleResponse, GoogleThinkingConfig, GoogleTool,
};
use crate::types::{
    AdaptiveEffort, AiResponse, AiStreamChunk, CompletionParams, Content, ContentPart, Effort, FinishReason, Message,
    Role, ToolCall, Usage,
};

/// Thinking budget in tokens for fixed-budget Gemini models
pub const fn thinking_budget(effort: Effort) -> Option<u32> {
    match effort {
        Effort::None => None,
        Effort::Minimal => Some(1024),
        Effort::Low => Some(4096),
        Effort::Medium => Some(8192),
        Effort::High => Some(24_576),
        Effort::Xhigh => Some(32_768),
    }
}

/// Whether the model takes a named `thinkingLevel` instead of a budget
pub fn supports_thinking_level(model: &str) -> bool {
    model.rsplit('/').next().unwrap_or(model).starts_with("gemini-3")
}

/// Reasoning configuration for a model and effort
pub fn thinking_config(model: &str, effort: Effort) -> Option<GoogleThinkingConfig> {
    if supports_thinking_level(model) {
        let level = match effort.adaptive()? {
            AdaptiveEffort::Low => "low",
            AdaptiveEffort::Medium => "medium",
            AdaptiveEffort::High | AdaptiveEffort::Max => "high",
        };
        Some(GoogleThinkingConfig {
            thinking_budget: None,
            thinking_level: Some(level.to_owned()),
            include_thoughts: true,
        })
    } else {
        thinking_budget(effort).map(|budget| GoogleThinkingConfig {
            thinking_budget: Some(budget),
            thinking_level: None,
            include_thoughts: true,
        })
    }
}

/// Map a Google `finishReason`; absent means a natural stop
pub fn map_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        None | Some("STOP") => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII") => FinishReason::ContentFilter,
        Some(_) => FinishReason::Unknown,
    }
}

// -- Outbound: internal params -> Google wire request --

impl From<&CompletionParams> for GoogleRequest {
    fn from(params: &CompletionParams) -> Self {
        let system_text = params
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_text())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        // Google pairs responses with calls by function name
        let call_names: HashMap<&str, &str> = params
            .messages
            .iter()
            .flat_map(Message::tool_calls)
            .map(|call| (call.id.as_str(), call.name.as_str()))
            .collect();

        let mut contents: Vec<GoogleContent> = Vec::new();
        for msg in &params.messages {
            match msg.role {
                Role::System => {}
                Role::User => contents.push(GoogleContent {
                    role: Some("user".to_owned()),
                    parts: content_to_parts(&msg.content),
                }),
                Role::Assistant => contents.push(GoogleContent {
                    role: Some("model".to_owned()),
                    parts: assistant_parts(msg),
                }),
                Role::Tool => {
                    let part = function_response_part(msg, &call_names);
                    match contents.last_mut() {
                        Some(last) if is_function_response_turn(last) => last.parts.push(part),
                        _ => contents.push(GoogleContent {
                            role: Some("user".to_owned()),
                            parts: vec![part],
                        }),
                    }
                }
            }
        }

        let generation_config = GoogleGenerationConfig {
            temperature: params.temperature,
            max_output_tokens: params.max_tokens,
            thinking_config: thinking_config(&params.model, params.effort),
        };

        let tools = (!params.tools().is_empty()).then(|| {
            vec![GoogleTool {
                function_declarations: params
                    .tools()
                    .iter()
                    .map(|t| GoogleFunctionDeclaration {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters_json_schema: t.parameters.clone(),
                    })
                    .collect(),
            }]
        });

        Self {
            contents,
            system_instruction: (!system_text.is_empty()).then(|| GoogleContent {
                role: None,
                parts: vec![GooglePart::text(system_text)],
            }),
            generation_config: Some(generation_config),
            tools,
        }
    }
}

fn is_function_response_turn(content: &GoogleContent) -> bool {
    content.role.as_deref() == Some("user")
        && !content.parts.is_empty()
        && content.parts.iter().all(|p| p.function_response.is_some())
}

/// Cache hints are dropped; remote images degrade to a text placeholder
fn content_to_parts(content: &Content) -> Vec<GooglePart> {
    match content {
        Content::Text(text) if text.is_empty() => Vec::new(),
        Content::Text(text) => vec![GooglePart::text(text.clone())],
        Content::Parts(parts) => parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text, .. } if text.is_empty() => None,
                ContentPart::Text { text, .. } => Some(GooglePart::text(text.clone())),
                ContentPart::Image { url, .. } => Some(match parse_data_url(url) {
                    Some(image) => GooglePart {
                        inline_data: Some(GoogleInlineData {
                            mime_type: image.mime_type,
                            data: image.data,
                        }),
                        ..GooglePart::default()
                    },
                    None => GooglePart::text(format!("[Image: {url}]")),
                }),
            })
            .collect(),
    }
}

fn assistant_parts(msg: &Message) -> Vec<GooglePart> {
    let mut parts = content_to_parts(&msg.content);
    parts.extend(msg.tool_calls().iter().map(|call| GooglePart {
        function_call: Some(GoogleFunctionCall {
            id: None,
            name: call.name.clone(),
            args: call.input.clone(),
        }),
        thought_signature: call.signature.clone(),
        ..GooglePart::default()
    }));
    parts
}

fn function_response_part(msg: &Message, call_names: &HashMap<&str, &str>) -> GooglePart {
    let call_id = msg.tool_call_id.as_deref().unwrap_or_default();
    let name = if let Some(name) = call_names.get(call_id) {
        (*name).to_owned()
    } else {
        tracing::warn!(tool_call_id = call_id, "no prior tool call for tool result, using id as name");
        call_id.to_owned()
    };

    let text = msg.content.as_text();
    let response = match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value @ serde_json::Value::Object(_)) => value,
        Ok(value) => serde_json::json!({ "result": value }),
        Err(_) => serde_json::json!({ "result": text }),
    };

    GooglePart {
        function_response: Some(GoogleFunctionResponse {
            id: None,
            name,
            response,
        }),
        ..GooglePart::default()
    }
}

// -- Response conversion: Google -> internal --

/// Text, reasoning and tool calls extracted from a candidate's parts
#[derive(Debug, Default)]
struct CandidateParts {
    content: String,
    reasoning: String,
    tool_calls: Vec<ToolCall>,
}

fn split_parts(parts: Vec<GooglePart>) -> CandidateParts {
    let mut out = CandidateParts::default();
    for part in parts {
        if let Some(call) = part.function_call {
            out.tool_calls.push(ToolCall {
                id: call.id.unwrap_or_else(generate_call_id),
                name: call.name,
                input: if call.args.is_object() {
                    call.args
                } else {
                    serde_json::json!({})
                },
                signature: part.thought_signature,
            });
        } else if let Some(text) = part.text {
            if part.thought == Some(true) {
                out.reasoning.push_str(&text);
            } else {
                out.content.push_str(&text);
            }
        }
    }
    out
}

/// Finish reason of a response, accounting for blocked prompts and tool calls
fn response_finish_reason(resp: &GoogleResponse, has_tool_calls: bool) -> Option<FinishReason> {
    if resp.candidates.is_empty() {
        return resp
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
            .map(|_| FinishReason::ContentFilter);
    }
    let raw = resp.candidates[0].finish_reason.as_deref()?;
    Some(match map_finish_reason(Some(raw)) {
        FinishReason::Stop if has_tool_calls => FinishReason::ToolUse,
        other => other,
    })
}

/// Convert a complete `generateContent` response
///
/// `requested_model` is reported when the response carries no model version.
pub fn response_to_internal(mut resp: GoogleResponse, requested_model: &str) -> AiResponse {
    let parts = resp
        .candidates
        .first_mut()
        .and_then(|c| c.content.take())
        .map(|c| c.parts)
        .unwrap_or_default();
    let parts = split_parts(parts);

    let finish_reason = response_finish_reason(&resp, !parts.tool_calls.is_empty()).unwrap_or(
        if parts.tool_calls.is_empty() {
            FinishReason::Stop
        } else {
            FinishReason::ToolUse
        },
    );

    AiResponse {
        content: parts.content,
        reasoning: (!parts.reasoning.is_empty()).then_some(parts.reasoning),
        model: resp.model_version.unwrap_or_else(|| requested_model.to_owned()),
        usage: resp.usage_metadata.map(|u| {
            Usage::new(
                u.prompt_token_count,
                u.candidates_token_count.saturating_add(u.thoughts_token_count),
            )
        }),
        finish_reason,
        tool_calls: (!parts.tool_calls.is_empty()).then_some(parts.tool_calls),
    }
}

// -- Stream conversion --

/// State tracker for converting streamed `generateContent` chunks
///
/// Google sends function calls whole, so they are emitted immediately.
#[derive(Debug, Default)]
pub struct GoogleStreamState {
    saw_tool_call: bool,
    stopped: bool,
}

impl GoogleStreamState {
    /// Create a new stream state tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert one streamed response chunk
    pub fn convert_chunk(&mut self, mut chunk: GoogleResponse) -> Vec<AiStreamChunk> {
        let mut out = Vec::new();
        if self.stopped {
            return out;
        }

        let parts = chunk
            .candidates
            .first_mut()
            .and_then(|c| c.content.take())
            .map(|c| c.parts)
            .unwrap_or_default();

        for part in parts {
            if let Some(call) = part.function_call {
                self.saw_tool_call = true;
                out.push(AiStreamChunk::ToolUse {
                    id: call.id.unwrap_or_else(generate_call_id),
                    name: call.name,
                    input: if call.args.is_object() {
                        call.args
                    } else {
                        serde_json::json!({})
                    },
                    signature: part.thought_signature,
                });
            } else if let Some(text) = part.text.filter(|t| !t.is_empty()) {
                if part.thought == Some(true) {
                    out.push(AiStreamChunk::Reasoning { text });
                } else {
                    out.push(AiStreamChunk::Content { text });
                }
            }
        }

        if let Some(finish_reason) = response_finish_reason(&chunk, self.saw_tool_call) {
            out.push(AiStreamChunk::Stop { finish_reason });
            self.stopped = true;
        }

        out
    }
}

impl StreamDecoder for GoogleStreamState {
    fn decode(&mut self, data: &str) -> Result<Vec<AiStreamChunk>, LlmError> {
        match serde_json::from_str::<GoogleResponse>(data) {
            Ok(chunk) => Ok(self.convert_chunk(chunk)),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unparseable Google SSE event");
                Ok(Vec::new())
            }
        }
    }

    fn finish(&mut self) -> Vec<AiStreamChunk> {
        if self.stopped || !self.saw_tool_call {
            return Vec::new();
        }
        self.stopped = true;
        vec![AiStreamChunk::Stop {
            finish_reason: FinishReason::ToolUse,
        }]
    }
}
