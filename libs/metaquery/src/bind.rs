use serde::Serialize;
use serde_json::Value as JsonValue;

/// Bind values for the positional placeholders of a composed statement.
///
/// `parameters[i - 1]` is bound to `$i`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BindValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    TextArray(Vec<String>),
    Json(JsonValue),
}

impl BindValue {
    /// Maps a caller-supplied JSON scalar onto the closest SQL bind type.
    /// Objects, arrays and nulls are kept as JSON.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::String(s) => Self::Text(s.clone()),
            JsonValue::Bool(b) => Self::Boolean(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            other => Self::Json(other.clone()),
        }
    }

    /// Serializes a containment document (`{"field":{"value":...}}`) to the
    /// compact text form bound against `metadata @> $n`.
    pub(crate) fn document(doc: JsonValue) -> Self {
        Self::Text(doc.to_string())
    }
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for BindValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Vec<String>> for BindValue {
    fn from(value: Vec<String>) -> Self {
        Self::TextArray(value)
    }
}
