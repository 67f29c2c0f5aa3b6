use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};

use crate::errors::AppError;

/// Prompts shorter than this (after trimming) are rejected before any upstream call.
pub const MIN_PROMPT_CHARS: usize = 20;

/// Body of `POST /api/complete`.
#[derive(Debug, Default, Deserialize)]
pub struct CompletionRequest {
    pub prompt: Option<Value>,
}

/// Body of `POST /api/analyze`. Fields are loosely typed on purpose: wrong
/// shapes are defaulted (customer, scores, global score) or rejected (prompt)
/// rather than failing deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: Option<Value>,
    pub customer: Option<Value>,
    pub scores_by_area: Option<Value>,
    pub global_score: Option<Value>,
}

impl GenerateRequest {
    pub fn customer_map(&self) -> Map<String, Value> {
        as_object(self.customer.as_ref())
    }

    pub fn scores_map(&self) -> Map<String, Value> {
        as_object(self.scores_by_area.as_ref())
    }

    /// Only JSON numbers count; anything else is stored as null.
    pub fn global_score(&self) -> Option<f64> {
        self.global_score.as_ref().and_then(Value::as_f64)
    }
}

fn as_object(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

/// Parses a JSON request body. An empty body reads as `{}`.
pub fn parse_json_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid JSON body: {e}")))
}

/// Returns the prompt exactly as submitted once it passes validation:
/// it must be a string of at least [`MIN_PROMPT_CHARS`] characters after trimming.
pub fn validate_prompt(prompt: Option<&Value>) -> Result<&str, AppError> {
    match prompt {
        Some(Value::String(p)) if p.trim().chars().count() >= MIN_PROMPT_CHARS => Ok(p.as_str()),
        _ => Err(AppError::InvalidInput(
            "Missing or invalid prompt".to_string(),
        )),
    }
}
