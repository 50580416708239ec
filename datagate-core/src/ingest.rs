//! The single adapter boundary between external input and the core's native
//! types. Whatever shape the surrounding tooling hands over (a file, a raw
//! JSON string, an already-parsed value), it is normalized into a `Dataset`
//! here, before any check sees it.

use crate::domain::Dataset;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("dataset is not valid JSON: {0}")]
    Parse(serde_json::Error),
    #[error("dataset must be a JSON array of chat samples: {0}")]
    Shape(String),
}

pub fn dataset_from_value(value: serde_json::Value) -> Result<Dataset, IngestError> {
    if !value.is_array() {
        return Err(IngestError::Shape(format!(
            "expected an array, got {}",
            json_type_name(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| IngestError::Shape(e.to_string()))
}

pub fn dataset_from_str(raw: &str) -> Result<Dataset, IngestError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(IngestError::Parse)?;
    dataset_from_value(value)
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
