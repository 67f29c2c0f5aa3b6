use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::request::{parse_json_body, validate_prompt, CompletionRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub text: String,
}

/// POST /api/complete
///
/// Forwards the prompt to the LLM and returns the joined text. Unlike report
/// generation, an empty completion is a normal answer here (`{"text": ""}`).
pub async fn handle_complete(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CompletionResponse>, AppError> {
    let completer = state.completer()?;
    let request: CompletionRequest = parse_json_body(&body)?;
    let prompt = validate_prompt(request.prompt.as_ref())?;

    let text = completer.complete(prompt).await?;

    Ok(Json(CompletionResponse { text }))
}
