//! Conversion between the provider-agnostic types and each wire format
//!
//! Each submodule handles one provider's protocol: outbound requests,
//! inbound responses, and a stateful [`StreamDecoder`] for SSE payloads.

pub mod anthropic;
pub mod google;
pub mod openai;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::error::LlmError;
use crate::types::AiStreamChunk;

/// Incremental decoder from one provider's SSE `data` payloads to chunks
///
/// Decoders never emit anything after their own `Stop`; the shared stream
/// driver additionally guarantees that exactly one `Stop` reaches the caller.
pub trait StreamDecoder: Send + 'static {
    /// Decode one SSE `data` payload
    ///
    /// Unparseable payloads are skipped; only provider-reported errors fail.
    fn decode(&mut self, data: &str) -> Result<Vec<AiStreamChunk>, LlmError>;

    /// Flush buffered state when the event stream ends
    fn finish(&mut self) -> Vec<AiStreamChunk> {
        Vec::new()
    }
}

/// Image payload decoded from a `data:` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// MIME type (e.g. "image/png")
    pub mime_type: String,
    /// Base64-encoded bytes
    pub data: String,
}

/// Decode a `data:` URL into a MIME type and base64 payload
///
/// Returns `None` for any other URL. Payloads that are not already base64 are
/// encoded.
pub fn parse_data_url(url: &str) -> Option<InlineImage> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;

    let (mime_type, is_base64) = match meta.strip_suffix(";base64") {
        Some(mime_type) => (mime_type, true),
        None => (meta, false),
    };
    let mime_type = match mime_type.split(';').next() {
        Some(mime) if !mime.is_empty() => mime.to_owned(),
        _ => "application/octet-stream".to_owned(),
    };

    let data = if is_base64 {
        payload.to_owned()
    } else {
        STANDARD.encode(payload.as_bytes())
    };

    Some(InlineImage { mime_type, data })
}

/// Parse a reassembled tool-argument payload
///
/// Empty payloads mean "no arguments". Malformed or non-object payloads
/// degrade to `{}` with a warning.
pub fn parse_tool_arguments(tool: &str, raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(serde_json::Map::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => {
            tracing::warn!(tool, kind = json_kind(&other), "tool arguments are not an object, using {{}}");
            Value::Object(serde_json::Map::new())
        }
        Err(e) => {
            tracing::warn!(tool, error = %e, "unparseable tool arguments, using {{}}");
            Value::Object(serde_json::Map::new())
        }
    }
}

/// Fresh identifier for a tool call the provider left unnamed
pub fn generate_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4().simple())
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
