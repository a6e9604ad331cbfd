//! Lenient JSON extraction from free-text model output.
//!
//! Models asked for "JSON only" still wrap it in code fences or prose. Stages:
//! 1. parse the whole (trimmed) text
//! 2. parse the body of the first fenced block
//! 3. parse the first JSON object or array embedded anywhere in the text

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid fence regex"));

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to extract JSON from response: {0}")]
    NoJson(String),

    #[error("Failed to parse JSON from markdown: {0}")]
    Fenced(String),

    #[error("JSON did not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Extracts the first JSON value from `raw` and deserializes it into `T`.
pub fn extract_json<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    let value = extract_json_value(raw)?;
    Ok(serde_json::from_value(value)?)
}

/// Extracts the first JSON value from `raw` without imposing a shape.
pub fn extract_json_value(raw: &str) -> Result<Value, ParseError> {
    let trimmed = raw.trim();

    let direct_error = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let fenced_error = match FENCED_BLOCK.captures(trimmed).and_then(|c| c.get(1)) {
        Some(body) => match serde_json::from_str::<Value>(body.as_str()) {
            Ok(value) => return Ok(value),
            Err(e) => Some(e),
        },
        None => None,
    };

    if let Some(value) = first_embedded_value(trimmed) {
        return Ok(value);
    }

    Err(match fenced_error {
        Some(e) => ParseError::Fenced(e.to_string()),
        None => ParseError::NoJson(direct_error.to_string()),
    })
}

/// Scans for the first `{` or `[` that starts a complete JSON value.
/// Trailing prose after the value is ignored.
fn first_embedded_value(text: &str) -> Option<Value> {
    text.char_indices()
        .filter(|(_, c)| *c == '{' || *c == '[')
        .find_map(|(start, _)| {
            serde_json::Deserializer::from_str(&text[start..])
                .into_iter::<Value>()
                .next()
                .and_then(Result::ok)
        })
}
