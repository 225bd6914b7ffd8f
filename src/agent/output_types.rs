use serde_json::Value;

/// Output produced by a SQL agent, classified into a closed set of shapes.
///
/// Upstream agents answer with plain strings, nested mappings carrying
/// metadata, lists of mixed fragments or serialized message objects. The
/// shape is decided once, when the raw JSON crosses into this process, so
/// everything downstream can match on a fixed set of variants.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAgentOutput {
    /// No output at all
    Null,
    /// Plain text
    Text(String),
    /// Key/value pairs in the order the upstream produced them
    Mapping(Vec<(String, RawAgentOutput)>),
    /// Ordered fragments
    Sequence(Vec<RawAgentOutput>),
    /// A message object exposing a `content` field
    ContentCarrier(Box<RawAgentOutput>),
    /// Anything else, held as its default string form
    Opaque(String),
}

impl RawAgentOutput {
    /// Look up a mapping field by key. Non-mappings have no fields.
    pub fn field(&self, key: &str) -> Option<&RawAgentOutput> {
        match self {
            RawAgentOutput::Mapping(entries) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Short name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RawAgentOutput::Null => "null",
            RawAgentOutput::Text(_) => "text",
            RawAgentOutput::Mapping(_) => "mapping",
            RawAgentOutput::Sequence(_) => "sequence",
            RawAgentOutput::ContentCarrier(_) => "content_carrier",
            RawAgentOutput::Opaque(_) => "opaque",
        }
    }

    /// Convert back into JSON for display purposes
    pub fn to_json(&self) -> Value {
        match self {
            RawAgentOutput::Null => Value::Null,
            RawAgentOutput::Text(text) => Value::String(text.clone()),
            RawAgentOutput::Mapping(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            RawAgentOutput::Sequence(items) => {
                Value::Array(items.iter().map(RawAgentOutput::to_json).collect())
            }
            RawAgentOutput::ContentCarrier(content) => {
                serde_json::json!({ "content": content.to_json() })
            }
            RawAgentOutput::Opaque(repr) => Value::String(repr.clone()),
        }
    }
}

impl From<&str> for RawAgentOutput {
    fn from(text: &str) -> Self {
        RawAgentOutput::Text(text.to_string())
    }
}

impl From<String> for RawAgentOutput {
    fn from(text: String) -> Self {
        RawAgentOutput::Text(text)
    }
}

impl From<Value> for RawAgentOutput {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RawAgentOutput::Null,
            Value::String(text) => RawAgentOutput::Text(text),
            Value::Bool(_) | Value::Number(_) => RawAgentOutput::Opaque(value.to_string()),
            Value::Array(items) => {
                RawAgentOutput::Sequence(items.into_iter().map(RawAgentOutput::from).collect())
            }
            Value::Object(map) => {
                if map.contains_key("lc") {
                    match map.get("type").and_then(|v| v.as_str()) {
                        // Serialized message object, e.g. an AIMessage
                        Some("constructor") => {
                            if let Some(content) = map
                                .get("kwargs")
                                .and_then(|kwargs| kwargs.get("content"))
                            {
                                return RawAgentOutput::ContentCarrier(Box::new(
                                    RawAgentOutput::from(content.clone()),
                                ));
                            }
                        }
                        Some("not_implemented") => {
                            let repr = map
                                .get("repr")
                                .and_then(|v| v.as_str())
                                .map(str::to_string)
                                .unwrap_or_else(|| Value::Object(map.clone()).to_string());
                            return RawAgentOutput::Opaque(repr);
                        }
                        _ => {}
                    }
                }

                RawAgentOutput::Mapping(
                    map.into_iter()
                        .map(|(k, v)| (k, RawAgentOutput::from(v)))
                        .collect(),
                )
            }
        }
    }
}
