//! Lenient parsing of model output.
//!
//! Models wrap JSON in code fences, prepend chatter, or return the wrong
//! shape. Every parser here either produces a well-typed value or a
//! [`CompletionError::Malformed`]; nothing panics on bad input.

use super::client::{truncate_str, CompletionError};
use super::tone::{Tone, ToneReading};
use crate::suggest::advisory::AdvisoryItem;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Strip markdown code fences from a response
pub(crate) fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let clean = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```JSON"))
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let clean = clean.strip_suffix("```").unwrap_or(clean);
    clean.trim()
}

/// Extract a JSON fragment between matching delimiters
pub(crate) fn extract_json_fragment(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if start <= end {
        Some(&text[start..=end])
    } else {
        None
    }
}

fn malformed(err: impl std::fmt::Display, payload: &str) -> CompletionError {
    CompletionError::Malformed(format!("{} (preview: {})", err, truncate_str(payload, 120)))
}

/// Parse the spelling response: an object mapping each misspelled word to
/// its corrections. Non-array values and empty lists are skipped.
pub fn parse_spelling_map(response: &str) -> Result<BTreeMap<String, Vec<String>>, CompletionError> {
    let clean = strip_markdown_fences(response);
    let fragment = extract_json_fragment(clean, '{', '}')
        .ok_or_else(|| malformed("no JSON object", clean))?;
    let value: serde_json::Value =
        serde_json::from_str(fragment).map_err(|e| malformed(e, fragment))?;
    let object = value
        .as_object()
        .ok_or_else(|| malformed("expected an object", fragment))?;

    let map = object
        .iter()
        .filter_map(|(word, corrections)| {
            let corrections: Vec<String> = corrections
                .as_array()?
                .iter()
                .filter_map(|c| c.as_str())
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty() && c != word)
                .collect();
            (!corrections.is_empty()).then(|| (word.clone(), corrections))
        })
        .collect();
    Ok(map)
}

/// Parse advisory items. Accepts a bare array or an object wrapping the array
/// under `comments` or `suggestions`; items missing text are skipped.
pub fn parse_advisory_items(response: &str) -> Result<Vec<AdvisoryItem>, CompletionError> {
    let clean = strip_markdown_fences(response);
    let value: serde_json::Value = match serde_json::from_str(clean) {
        Ok(v) => v,
        Err(_) => {
            let fragment = extract_json_fragment(clean, '[', ']')
                .ok_or_else(|| malformed("no JSON array", clean))?;
            serde_json::from_str(fragment).map_err(|e| malformed(e, fragment))?
        }
    };

    let array = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => match obj
            .remove("comments")
            .or_else(|| obj.remove("suggestions"))
        {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Err(malformed("object without an item array", clean)),
        },
        _ => return Err(malformed("expected an array", clean)),
    };

    Ok(array
        .into_iter()
        .filter_map(|item| serde_json::from_value::<AdvisoryItem>(item).ok())
        .filter(|item| !item.original_text.trim().is_empty())
        .collect())
}

#[derive(Deserialize)]
struct ToneJson {
    #[serde(default)]
    tone: String,
    #[serde(default)]
    confidence: Option<f32>,
}

/// Parse a tone classification. An unknown tone yields `tone: None`.
pub fn parse_tone(response: &str) -> Result<ToneReading, CompletionError> {
    let clean = strip_markdown_fences(response);
    let fragment = extract_json_fragment(clean, '{', '}')
        .ok_or_else(|| malformed("no JSON object", clean))?;
    let parsed: ToneJson = serde_json::from_str(fragment).map_err(|e| malformed(e, fragment))?;
    Ok(ToneReading {
        tone: Tone::from_label(&parsed.tone),
        confidence: parsed.confidence.map(|c| c.clamp(0.0, 1.0)),
    })
}

/// Clean a plain-text rewrite: trim, drop fences and surrounding quotes.
pub fn clean_rewrite(response: &str) -> Result<String, CompletionError> {
    let text = strip_markdown_fences(response);
    let text = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
        .trim();
    if text.is_empty() {
        return Err(CompletionError::EmptyResponse);
    }
    Ok(text.to_string())
}
