// Flattens agent output into the single string shown to the user.
// Metadata fields are dropped, nested content is followed, fragments are
// joined with single spaces.

use crate::agent::output_types::RawAgentOutput;

/// Mapping keys that carry internal bookkeeping rather than user-facing text
pub const METADATA_KEYS: &[&str] = &["type", "thought_signature", "metadata", "id"];

/// Returned to the user when the agent answered with nothing displayable
pub const FALLBACK_RESPONSE: &str =
    "I processed your request but couldn't generate a response.";

/// Extract the displayable text from an agent output. Never fails.
pub fn normalize(value: &RawAgentOutput) -> String {
    match value {
        RawAgentOutput::Null => String::new(),
        RawAgentOutput::Text(text) => text.clone(),
        RawAgentOutput::Mapping(entries) => {
            // `text` is the final answer for Gemini-style parts, taken as-is
            if let Some(text) = value.field("text") {
                return terminal_text(text);
            }
            if let Some(content) = value.field("content") {
                return normalize(content);
            }
            join_fragments(
                entries
                    .iter()
                    .filter(|(key, _)| !is_metadata_key(key))
                    .map(|(_, v)| v),
            )
        }
        RawAgentOutput::Sequence(items) => join_fragments(items.iter()),
        RawAgentOutput::ContentCarrier(content) => normalize(content),
        RawAgentOutput::Opaque(repr) => unless_structure_dump(repr.clone()),
    }
}

/// Normalize and substitute [`FALLBACK_RESPONSE`] for blank results.
pub fn finalize(value: &RawAgentOutput) -> String {
    let text = normalize(value);
    if text.trim().is_empty() {
        tracing::warn!(
            "Agent output of kind '{}' produced no displayable text; using fallback",
            value.kind()
        );
        FALLBACK_RESPONSE.to_string()
    } else {
        text
    }
}

pub fn is_metadata_key(key: &str) -> bool {
    METADATA_KEYS.contains(&key)
}

fn join_fragments<'a>(values: impl Iterator<Item = &'a RawAgentOutput>) -> String {
    values
        .map(normalize)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stringify a `text` field without descending into it.
fn terminal_text(value: &RawAgentOutput) -> String {
    match value {
        RawAgentOutput::Null => String::new(),
        RawAgentOutput::Text(text) => text.clone(),
        RawAgentOutput::Opaque(repr) => unless_structure_dump(repr.clone()),
        composite => unless_structure_dump(composite.to_json().to_string()),
    }
}

/// An unextracted structure dump is worse than nothing
fn unless_structure_dump(repr: String) -> String {
    if repr.starts_with('{') || repr.starts_with('[') {
        String::new()
    } else {
        repr
    }
}
