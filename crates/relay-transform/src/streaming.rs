use bytes::Bytes;
use futures::StreamExt;
use serde_json::{Map, Value};

use crate::buffer_utils::SseFrameBuffer;
use crate::error::Result;
use crate::response::ByteStream;

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_MARKER: &str = "[DONE]";

const REASONING_FIELD: &str = "reasoning_content";
const THINKING_FIELD: &str = "thinking";

/// One complete SSE line, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// Payload of a `data: ` line, trimmed
    Data(&'a str),
    /// `data: [DONE]`
    Done,
    /// Any other non-blank line (`event:`, `id:`, comments)
    Other(&'a str),
    /// Blank line or a data line with no payload
    Empty,
}

impl<'a> SseLine<'a> {
    pub fn parse(line: &'a str) -> Self {
        match line.strip_prefix(DATA_PREFIX) {
            Some(payload) => match payload.trim() {
                "" => Self::Empty,
                DONE_MARKER => Self::Done,
                data => Self::Data(data),
            },
            None if line.trim().is_empty() => Self::Empty,
            None => Self::Other(line),
        }
    }
}

/// Per-response flags tracking the thinking phase of a stream.
/// Nothing downstream reads them yet; they are reset on `[DONE]`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteState {
    pub thinking_started: bool,
    pub thinking_ended: bool,
}

/// Renames `reasoning_content` to `thinking.content` in chat completion
/// payloads so that clients expecting the thinking schema can read them.
#[derive(Debug, Default)]
pub struct ReasoningRewriter {
    state: RewriteState,
}

impl ReasoningRewriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RewriteState {
        self.state
    }

    /// Rewrite one complete SSE line into the text to emit downstream.
    ///
    /// Data events come back terminated by a blank line; other lines get a
    /// single `\n`. Blank lines and empty data lines produce nothing, since
    /// every emitted event already carries its own separator.
    pub fn rewrite_line(&mut self, line: &str) -> Option<String> {
        match SseLine::parse(line) {
            SseLine::Empty => None,
            SseLine::Other(raw) => Some(format!("{}\n", raw)),
            SseLine::Done => {
                self.state = RewriteState::default();
                Some(format!("{}{}\n\n", DATA_PREFIX, DONE_MARKER))
            }
            SseLine::Data(payload) => {
                let data = match serde_json::from_str::<Value>(payload) {
                    Ok(event) => {
                        let event = self.rewrite_event(event);
                        event.to_string()
                    }
                    Err(e) => {
                        tracing::warn!("Passing through unparseable stream payload: {}", e);
                        payload.to_string()
                    }
                };
                Some(format!("{}{}\n\n", DATA_PREFIX, data))
            }
        }
    }

    /// Relocate `choices[0].delta.reasoning_content` of a streaming chunk.
    pub fn rewrite_event(&mut self, event: Value) -> Value {
        let (event, relocated) = relocate_reasoning(event, "delta");

        if relocated {
            tracing::debug!("Rewrote reasoning delta to thinking");
            self.state.thinking_started = true;
        } else if self.state.thinking_started && has_content_delta(&event) {
            self.state.thinking_ended = true;
        }

        event
    }
}

/// Relocate `choices[0].message.reasoning_content` of a whole (non-streaming) completion.
pub fn rewrite_completion(body: Value) -> Value {
    relocate_reasoning(body, "message").0
}

/// Parse, rewrite and re-serialize a buffered JSON completion body.
pub fn rewrite_json_body(body: &[u8]) -> Result<Bytes> {
    let parsed: Value = serde_json::from_slice(body)?;
    let rewritten = rewrite_completion(parsed);
    Ok(Bytes::from(serde_json::to_vec(&rewritten)?))
}

/// Frame an upstream SSE byte stream into lines and rewrite each one.
///
/// Chunks are consumed one at a time as the caller polls, and output keeps
/// arrival order. A partial line still buffered when upstream ends is dropped.
pub fn rewrite_sse_stream(upstream: ByteStream) -> ByteStream {
    Box::pin(async_stream::stream! {
        let mut upstream = upstream;
        let mut frames = SseFrameBuffer::with_capacity(8192);
        let mut rewriter = ReasoningRewriter::new();

        while let Some(chunk_result) = upstream.next().await {
            match chunk_result {
                Ok(bytes) => {
                    for line in frames.feed(&bytes) {
                        if let Some(out) = rewriter.rewrite_line(&line) {
                            yield Ok(Bytes::from(out));
                        }
                    }
                }
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
        }

        if !frames.is_empty() {
            tracing::debug!("Discarding {} bytes of unterminated stream data", frames.len());
        }
    })
}

// Rebuilds `choices[0].<holder>` without the reasoning field and with a
// `thinking` object appended. Returns whether anything moved.
fn relocate_reasoning(mut payload: Value, holder: &str) -> (Value, bool) {
    let Some(target) = payload
        .get_mut("choices")
        .and_then(|choices| choices.get_mut(0))
        .and_then(|choice| choice.get_mut(holder))
        .and_then(Value::as_object_mut)
    else {
        return (payload, false);
    };

    if !target.get(REASONING_FIELD).is_some_and(is_present) {
        return (payload, false);
    }

    let fields = std::mem::take(target);
    let mut rebuilt = Map::with_capacity(fields.len());
    let mut reasoning = Value::Null;
    for (key, value) in fields {
        if key == REASONING_FIELD {
            reasoning = value;
        } else {
            rebuilt.insert(key, value);
        }
    }
    rebuilt.insert(
        THINKING_FIELD.to_string(),
        serde_json::json!({ "content": reasoning }),
    );
    *target = rebuilt;

    (payload, true)
}

// null, "", false and 0 count as absent
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn has_content_delta(event: &Value) -> bool {
    event
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}
