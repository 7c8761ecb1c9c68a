// Message content normalization
// Upstream accepts `content` only as an array of `{type: "text", text}` blocks,
// while callers send strings, block arrays, bare objects or nothing at all.

use serde_json::{Map, Value};

use crate::types::ContentBlock;

/// Normalize every message in a `messages` array.
///
/// Anything other than an array is returned untouched so that an unexpected
/// request shape passes through instead of failing the call.
pub fn normalize_messages(messages: Value) -> Value {
    match messages {
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_message).collect()),
        other => other,
    }
}

/// Replace a single message's `content` with its block form.
/// All other fields of the message are carried over as-is.
pub fn normalize_message(message: Value) -> Value {
    let Value::Object(fields) = message else {
        return message;
    };

    let blocks = normalize_content(fields.get("content"));

    let mut normalized = Map::with_capacity(fields.len() + 1);
    for (key, value) in fields {
        if key != "content" {
            normalized.insert(key, value);
        }
    }
    normalized.insert("content".to_string(), blocks_to_value(&blocks));

    Value::Object(normalized)
}

/// Map any content shape to an ordered list of text blocks.
/// Only an explicitly empty array produces zero blocks.
pub fn normalize_content(content: Option<&Value>) -> Vec<ContentBlock> {
    match content {
        Some(Value::String(s)) => vec![ContentBlock::text(s.as_str())],
        Some(Value::Array(items)) => items.iter().map(normalize_item).collect(),
        Some(Value::Object(obj)) => vec![object_to_block(obj)],
        // null, numbers, booleans and a missing field all collapse to one empty block
        _ => vec![ContentBlock::empty()],
    }
}

fn normalize_item(item: &Value) -> ContentBlock {
    match item {
        Value::String(s) => ContentBlock::text(s.as_str()),
        Value::Object(obj) => object_to_block(obj),
        other => ContentBlock::text(other.to_string()),
    }
}

// Covers both `{type: "text", text}` blocks and foreign objects that happen to carry `text`.
fn object_to_block(obj: &Map<String, Value>) -> ContentBlock {
    match obj.get("text") {
        Some(Value::String(text)) => ContentBlock::text(text.as_str()),
        _ => ContentBlock::text(Value::Object(obj.clone()).to_string()),
    }
}

fn blocks_to_value(blocks: &[ContentBlock]) -> Value {
    Value::Array(
        blocks
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => serde_json::json!({
                    "type": "text",
                    "text": text,
                }),
            })
            .collect(),
    )
}
