//! Outbound email behind the `Mailer` capability. Delivery goes through SendGrid.

use async_trait::async_trait;
use thiserror::Error;

pub mod sendgrid;

pub use sendgrid::SendGridMailer;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Email request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SendGrid error: {status} {detail}")]
    Rejected { status: u16, detail: String },
}

/// A single-recipient message. `html` is optional; `text` is always sent.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}
