use thiserror::Error;

/// Failures that escape the pipeline. Everything else degrades to defaults.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The payload root is not a JSON object; no shape heuristic applies.
    #[error("payload root must be a JSON object, got {0}")]
    MalformedPayload(&'static str),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
