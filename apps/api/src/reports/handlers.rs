//! Axum route handlers for report generation and rendering.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Query, State},
    response::Html,
    Json,
};

use crate::errors::{AppError, PlainTextError};
use crate::models::request::{parse_json_body, GenerateRequest};
use crate::reports::generator::{generate_report, GenerateResponse};
use crate::reports::render::{load_report, render_report};
use crate::state::AppState;

/// POST /api/analyze
///
/// Runs the completion, stores the report under a fresh id/token pair, emails
/// the link, and returns it.
pub async fn handle_generate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<GenerateResponse>, AppError> {
    let request: GenerateRequest = parse_json_body(&body)?;
    let response = generate_report(&state, request).await?;
    Ok(Json(response))
}

/// GET /api/report?id=&token=
///
/// Browser-facing; errors are plain text. A repeated parameter keeps its last value.
pub async fn handle_render(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Html<String>, PlainTextError> {
    let present = |key: &str| query.get(key).filter(|s| !s.is_empty());
    let (Some(id), Some(token)) = (present("id"), present("token")) else {
        return Err(AppError::MissingParameters.into());
    };

    let record = load_report(state.store()?, id, token).await?;
    Ok(Html(render_report(&record)))
}
