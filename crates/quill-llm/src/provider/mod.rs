//! Provider trait and the shared HTTP plumbing of its implementations

pub mod anthropic;
pub mod google;
pub mod openai;

use std::collections::VecDeque;
use std::pin::Pin;

use async_trait::async_trait;
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures_util::{Stream, StreamExt};
use indexmap::IndexMap;
use reqwest::RequestBuilder;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::context::RequestContext;
use crate::convert::StreamDecoder;
use crate::error::LlmError;
use crate::types::{AiResponse, AiStream, AiStreamChunk, CompletionParams, FinishReason};

/// Trait implemented by each completion backend
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider id this instance serves
    fn name(&self) -> &str;

    /// Send a non-streaming completion request
    async fn complete(&self, params: &CompletionParams, context: &RequestContext) -> Result<AiResponse, LlmError>;

    /// Send a streaming completion request
    ///
    /// The returned stream ends with exactly one `Stop` chunk unless it fails
    /// or is cancelled first.
    async fn stream(&self, params: &CompletionParams, context: &RequestContext) -> Result<AiStream, LlmError>;
}

/// Convert configured extra headers to a header map
///
/// Performs best-effort conversion, logging warnings for invalid entries
pub fn parse_headers(provider: &str, headers: &IndexMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let Ok(header_name) = HeaderName::try_from(name.as_str()) else {
            tracing::warn!(provider, header = %name, "ignoring invalid header name");
            continue;
        };
        let Ok(header_value) = HeaderValue::try_from(value.as_str()) else {
            tracing::warn!(provider, header = %name, "ignoring invalid header value");
            continue;
        };
        map.insert(header_name, header_value);
    }
    map
}

/// Send a request, racing it against the caller's cancellation
///
/// Non-success statuses become [`LlmError::Status`] carrying the body text.
pub(crate) async fn send(
    builder: RequestBuilder,
    provider: &str,
    cancellation: &CancellationToken,
) -> Result<reqwest::Response, LlmError> {
    let response = tokio::select! {
        biased;
        () = cancellation.cancelled() => return Err(LlmError::Cancelled),
        result = builder.send() => result.map_err(|e| {
            tracing::error!(provider, error = %e, "upstream request failed");
            LlmError::Upstream(e.to_string())
        })?,
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(provider, status = %status, "upstream returned error");
        return Err(LlmError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response)
}

/// Read and decode a JSON body, racing it against cancellation
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    cancellation: &CancellationToken,
) -> Result<T, LlmError> {
    tokio::select! {
        biased;
        () = cancellation.cancelled() => Err(LlmError::Cancelled),
        result = response.json::<T>() => result.map_err(|e| LlmError::Upstream(format!("failed to parse response: {e}"))),
    }
}

type EventStream = Pin<Box<dyn Stream<Item = Result<Event, EventStreamError<reqwest::Error>>> + Send>>;

/// Driver state for [`sse_stream`]
struct SseState<D> {
    events: EventStream,
    decoder: D,
    pending: VecDeque<AiStreamChunk>,
    stopped: bool,
    finished: bool,
    cancellation: CancellationToken,
}

impl<D: StreamDecoder> SseState<D> {
    /// Queue decoded chunks, dropping everything after the first `Stop`
    fn enqueue(&mut self, chunks: Vec<AiStreamChunk>) {
        for chunk in chunks {
            if self.stopped {
                break;
            }
            if matches!(chunk, AiStreamChunk::Stop { .. }) {
                self.stopped = true;
                self.finished = true;
            }
            self.pending.push_back(chunk);
        }
    }

    fn fail(mut self, error: LlmError) -> Option<(Result<AiStreamChunk, LlmError>, Self)> {
        self.pending.clear();
        self.finished = true;
        Some((Err(error), self))
    }
}

/// Turn an SSE response into a chunk stream using a provider decoder
///
/// Empty payloads and the `[DONE]` sentinel are skipped. When the upstream
/// ends without a terminal chunk, the decoder is flushed and a `Stop` is
/// synthesized. Cancellation yields [`LlmError::Cancelled`] and ends the stream.
pub(crate) fn sse_stream<D: StreamDecoder>(
    response: reqwest::Response,
    decoder: D,
    cancellation: CancellationToken,
) -> AiStream {
    let state = SseState {
        events: Box::pin(response.bytes_stream().eventsource()),
        decoder,
        pending: VecDeque::new(),
        stopped: false,
        finished: false,
        cancellation,
    };

    Box::pin(futures_util::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(chunk) = state.pending.pop_front() {
                return Some((Ok(chunk), state));
            }
            if state.finished {
                return None;
            }

            let next = tokio::select! {
                biased;
                () = state.cancellation.cancelled() => None,
                event = state.events.next() => Some(event),
            };
            let Some(next) = next else {
                return state.fail(LlmError::Cancelled);
            };

            match next {
                Some(Ok(event)) => {
                    let data = event.data.trim();
                    if data.is_empty() || data == "[DONE]" {
                        continue;
                    }
                    match state.decoder.decode(data) {
                        Ok(chunks) => state.enqueue(chunks),
                        Err(e) => return state.fail(e),
                    }
                }
                Some(Err(e)) => return state.fail(LlmError::Streaming(e.to_string())),
                None => {
                    let chunks = state.decoder.finish();
                    state.enqueue(chunks);
                    if !state.stopped {
                        state.enqueue(vec![AiStreamChunk::Stop {
                            finish_reason: FinishReason::Stop,
                        }]);
                    }
                    state.finished = true;
                }
            }
        }
    }))
}
