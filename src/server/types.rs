use super::framing::is_non_empty;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NO_DESCRIPTION: &str = "No description provided";
pub const INVALID_JSON: &str = "Invalid JSON format";
pub const SERVER_ERROR_PREFIX: &str = "Server error: ";

#[derive(Debug, Default)]
pub struct PredictionRequest {
    pub description: Option<String>,
}

/// Wire shape of a request. `description` stays untyped until the falsy
/// values have been sorted out.
#[derive(Deserialize)]
struct RawRequest {
    #[serde(default)]
    description: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: String,
}

impl PredictionRequest {
    /// Decodes a fully framed request.
    ///
    /// Syntax errors map to [`Error::Decode`]. JSON that parses but has the
    /// wrong shape (not an object, non-empty non-string description) maps to
    /// [`Error::InvalidRequest`]. An empty description of any type (`false`,
    /// `0`, `[]`, `{}`) counts as absent.
    pub fn decode(buffer: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(buffer).map_err(Error::Decode)?;
        // Checked up front: derived struct decoding would also accept arrays.
        if !value.is_object() {
            return Err(Error::invalid_request(format!(
                "expected a JSON object, got {}",
                kind(&value)
            )));
        }
        let raw: RawRequest =
            serde_json::from_value(value).map_err(|e| Error::invalid_request(e.to_string()))?;

        let description = match raw.description {
            Value::String(s) => Some(s),
            other if !is_non_empty(&other) => None,
            other => {
                return Err(Error::invalid_request(format!(
                    "field \"description\" must be a string, got {}",
                    kind(&other)
                )));
            }
        };
        Ok(Self { description })
    }

    /// The description, if present and non-empty.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

impl PredictionResponse {
    pub fn new(prediction: impl Into<String>) -> Self {
        Self {
            prediction: prediction.into(),
        }
    }

    pub fn server_error(detail: impl std::fmt::Display) -> Self {
        Self::new(format!("{SERVER_ERROR_PREFIX}{detail}"))
    }

    /// Compact JSON followed by a newline, the one response framing on the wire.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
