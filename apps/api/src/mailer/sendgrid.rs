use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;

use super::{EmailMessage, MailError, Mailer};

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Serialize)]
struct SendGridPayload<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

impl<'a> SendGridPayload<'a> {
    fn new(from: &'a str, message: &'a EmailMessage) -> Self {
        let mut content = vec![Content {
            content_type: "text/plain",
            value: &message.text,
        }];
        if let Some(html) = &message.html {
            content.push(Content {
                content_type: "text/html",
                value: html,
            });
        }
        Self {
            personalizations: vec![Personalization {
                to: vec![Address { email: &message.to }],
            }],
            from: Address { email: from },
            subject: &message.subject,
            content,
        }
    }
}

/// SendGrid v3 mail-send client. The sender must be a verified address.
#[derive(Clone)]
pub struct SendGridMailer {
    client: Client,
    api_key: String,
    from: String,
}

impl SendGridMailer {
    pub fn new(client: Client, api_key: String, from: String) -> Self {
        Self {
            client,
            api_key,
            from,
        }
    }
}

/// SendGrid answers 202 with an empty body; anything else is a rejection.
async fn check_reply(response: Response) -> Result<(), MailError> {
    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(MailError::Rejected {
            status: status.as_u16(),
            detail,
        });
    }
    Ok(())
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let payload = SendGridPayload::new(&self.from, message);

        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        check_reply(response).await?;

        tracing::debug!(subject = %message.subject, "email accepted by SendGrid");
        Ok(())
    }
}
