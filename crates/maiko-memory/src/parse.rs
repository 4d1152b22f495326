//! Recovering a JSON fact list from free-form model output

use serde_json::Value;

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Locate the JSON payload inside a model reply.
///
/// Lookup order:
/// 1. the body of the first fence tagged `json`;
/// 2. the body of the first fence of any kind, skipping a bare info string;
/// 3. the whole reply.
///
/// An unterminated fence runs to the end of the text. The result is trimmed.
pub fn extract_json_block(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find(JSON_FENCE) {
        let body = &trimmed[start + JSON_FENCE.len()..];
        let body = match body.find(FENCE) {
            Some(end) => &body[..end],
            None => body,
        };
        return body.trim();
    }

    if let Some(start) = trimmed.find(FENCE) {
        let after_ticks = &trimmed[start + FENCE.len()..];
        let body = match after_ticks.find(FENCE) {
            Some(end) => &after_ticks[..end],
            None => after_ticks,
        };
        return match body.split_once('\n') {
            Some((first, rest)) if is_info_string(first) => rest.trim(),
            _ => body.trim(),
        };
    }

    trimmed
}

/// A fence's first line is an info string only when it is a bare tag such as
/// `text` or `JSON5`; anything else is the start of the payload.
fn is_info_string(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
}

/// Parse a model reply into a list of facts.
///
/// Returns `None` unless the extracted block is a JSON array. String items
/// are kept verbatim; blank strings and non-string items are dropped.
pub fn parse_fact_list(text: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(extract_json_block(text)).ok()?;
    let items = value.as_array()?;

    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .collect(),
    )
}
