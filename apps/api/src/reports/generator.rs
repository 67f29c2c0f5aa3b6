//! Report generation — orchestrates the full pipeline for one request.
//!
//! Flow: config checks → prompt validation → LLM completion → id/token →
//!       store with expiry → customer email → internal copy → link.
//!
//! Nothing is rolled back: if an email fails after the record was stored, the
//! record simply expires on its own.

use anyhow::Context;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::report::ReportRecord;
use crate::models::request::{validate_prompt, GenerateRequest};
use crate::reports::emails::{customer_email, internal_copy, Recipient};
use crate::reports::tokens::{new_access_token, new_report_id};
use crate::reports::REPORT_PATH;
use crate::state::AppState;
use crate::store::report_key;

pub const SUCCESS_MESSAGE: &str = "Report generated and emailed.";

/// Response body of `POST /api/analyze`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub ok: bool,
    pub report_url: String,
    pub expires_days: i64,
    pub message: String,
}

/// `<base>/api/report?id=<id>&token=<token>`, dropping one trailing slash from the base.
pub fn report_url(base_url: &str, id: &str, token: &str) -> String {
    let base = base_url.strip_suffix('/').unwrap_or(base_url);
    format!("{base}{REPORT_PATH}?id={id}&token={token}")
}

/// Runs the generation pipeline. Every upstream call is awaited in sequence;
/// the first failure ends the request.
pub async fn generate_report(
    state: &AppState,
    request: GenerateRequest,
) -> Result<GenerateResponse, AppError> {
    let config = &state.config;
    let completer = state.completer()?;
    let admin_email = config.require_admin_email()?;
    let base_url = config.require_public_base_url()?;

    let prompt = validate_prompt(request.prompt.as_ref())?;

    let ai_analysis = completer.complete(prompt).await?;
    if ai_analysis.is_empty() {
        return Err(AppError::EmptyResult);
    }

    let id = new_report_id();
    let token = new_access_token();
    let url = report_url(base_url, &id, &token);

    let record = ReportRecord::new(
        id,
        token,
        request.customer_map(),
        request.scores_map(),
        request.global_score(),
        ai_analysis,
    );
    let payload = serde_json::to_string(&record).context("failed to serialize report")?;

    state
        .store()?
        .set_ex(&report_key(&record.id), config.ttl_seconds(), &payload)
        .await?;
    info!(report_id = %record.id, ttl_days = config.ttl_days, "report stored");

    let recipient = Recipient::from_record(&record);

    if let Some(message) = customer_email(&recipient, &url, config.ttl_days) {
        state.mailer()?.send(&message).await?;
        info!(report_id = %record.id, "customer email sent");
    }

    let copy = internal_copy(admin_email, &recipient, &url, &record.ai_analysis);
    state.mailer()?.send(&copy).await?;
    info!(report_id = %record.id, "internal copy sent");

    Ok(GenerateResponse {
        ok: true,
        report_url: url,
        expires_days: config.ttl_days,
        message: SUCCESS_MESSAGE.to_string(),
    })
}
