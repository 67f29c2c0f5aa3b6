use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::mailer::MailError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so the JSON handlers can return `Result<T, AppError>`;
/// the renderer wraps it in [`PlainTextError`] instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Configuration(String),

    #[error("Completion API error: {0}")]
    Completion(#[from] LlmError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Mail(#[from] MailError),

    #[error("Empty AI response")]
    EmptyResult,

    #[error("Missing id/token")]
    MissingParameters,

    #[error("Report not found or expired.")]
    NotFound,

    #[error("Invalid token.")]
    InvalidToken,

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable name of the failure class, echoed to clients as `kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::MethodNotAllowed => "MethodNotAllowed",
            AppError::Configuration(_) => "ConfigurationError",
            AppError::Completion(LlmError::Api { .. }) => "UpstreamError",
            AppError::Completion(_) => "ServerError",
            AppError::Store(_) | AppError::Mail(_) => "UpstreamError",
            AppError::EmptyResult => "EmptyResult",
            AppError::MissingParameters => "MissingParameters",
            AppError::NotFound => "NotFound",
            AppError::InvalidToken => "InvalidToken",
            AppError::Internal(_) => "ServerError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::MissingParameters => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidToken => StatusCode::FORBIDDEN,
            // The completion API's own status is passed through to the caller.
            AppError::Completion(LlmError::Api { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Configuration(_)
            | AppError::Completion(_)
            | AppError::Store(_)
            | AppError::Mail(_)
            | AppError::EmptyResult
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn json_body(&self) -> Value {
        let kind = self.kind();
        match self {
            AppError::Completion(LlmError::Api { body, .. }) => {
                json!({ "error": "Anthropic error", "kind": kind, "detail": body })
            }
            AppError::Completion(_)
            | AppError::Store(_)
            | AppError::Mail(_)
            | AppError::Internal(_) => {
                json!({ "error": "Server error", "kind": kind, "detail": self.to_string() })
            }
            _ => json!({ "error": self.to_string(), "kind": kind }),
        }
    }

    fn log(&self) {
        if self.status().is_server_error() {
            tracing::error!(kind = self.kind(), "request failed: {}", self);
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let mut response = (self.status(), Json(self.json_body())).into_response();
        if matches!(self, AppError::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(header::ALLOW, header::HeaderValue::from_static("POST"));
        }
        response
    }
}

/// Plain-text rendition of [`AppError`] for the browser-facing report page.
#[derive(Debug)]
pub struct PlainTextError(pub AppError);

impl From<AppError> for PlainTextError {
    fn from(err: AppError) -> Self {
        PlainTextError(err)
    }
}

impl IntoResponse for PlainTextError {
    fn into_response(self) -> Response {
        let err = self.0;
        err.log();
        let body = match &err {
            AppError::MissingParameters | AppError::NotFound | AppError::InvalidToken => {
                err.to_string()
            }
            other => format!("Server error: {other}"),
        };
        (
            err.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}
