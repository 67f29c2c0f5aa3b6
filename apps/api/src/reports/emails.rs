//! Outgoing messages for a freshly generated report.

use crate::mailer::EmailMessage;
use crate::models::report::ReportRecord;
use crate::reports::render::escape_html;

/// Who the report is for, as shown in subjects and greetings.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipient {
    /// Trimmed; `None` when blank, which skips the customer email.
    pub email: Option<String>,
    pub company: String,
    pub person: String,
}

impl Recipient {
    pub fn from_record(record: &ReportRecord) -> Self {
        let email = record
            .customer_text("email")
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        Self {
            email,
            company: record.company().trim().to_string(),
            person: record.person().trim().to_string(),
        }
    }
}

/// Link email for the customer. Returns `None` when there is no address.
pub fn customer_email(recipient: &Recipient, report_url: &str, ttl_days: i64) -> Option<EmailMessage> {
    let to = recipient.email.clone()?;
    let person = &recipient.person;

    let text = format!(
        "Hola {person},\n\nTu reporte está listo. Link único:\n{report_url}\n\nExpira en {ttl_days} día(s)."
    );

    let html = format!(
        r#"
        <div style="font-family:Arial,sans-serif;color:#0f172a">
          <h2>Reporte de pre-diagnóstico</h2>
          <p>Hola <b>{person}</b>,</p>
          <p>Tu reporte está listo. Ábrelo aquí (link único):</p>
          <p><a href="{url}">{url}</a></p>
          <p style="color:#64748b;font-size:12px">Expira en {ttl_days} día(s).</p>
        </div>"#,
        person = escape_html(person),
        url = escape_html(report_url),
    );

    Some(EmailMessage {
        to,
        subject: format!("Tu reporte de pre-diagnóstico — {}", recipient.company),
        text,
        html: Some(html),
    })
}

/// Plain-text internal copy with customer metadata and the full analysis.
pub fn internal_copy(
    admin_email: &str,
    recipient: &Recipient,
    report_url: &str,
    ai_analysis: &str,
) -> EmailMessage {
    let Recipient {
        email,
        company,
        person,
    } = recipient;
    let email = email.as_deref().unwrap_or("-");

    EmailMessage {
        to: admin_email.to_string(),
        subject: format!("Copia interna — Reporte {company} ({person})"),
        text: format!(
            "Nuevo reporte generado.\n\nEmpresa: {company}\nCliente: {person}\nEmail: {email}\n\nLink:\n{report_url}\n\n--- AI ---\n\n{ai_analysis}"
        ),
        html: None,
    }
}
