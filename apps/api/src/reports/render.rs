//! Report lookup and HTML rendering.
//!
//! Every value placed into the page goes through [`escape_html`]; the analysis
//! text and customer fields are user/LLM controlled.

use anyhow::Context;

use crate::errors::AppError;
use crate::models::report::{score_text, ReportRecord};
use crate::reports::tokens::tokens_match;
use crate::store::{report_key, ReportStore};

/// Escapes `&`, `<`, `>` and `"`. `&` goes first so entities are not double-escaped.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

/// Loads `report:<id>` and checks the token. Missing and expired records are
/// indistinguishable; a wrong token never reveals record content.
pub async fn load_report(
    store: &dyn ReportStore,
    id: &str,
    token: &str,
) -> Result<ReportRecord, AppError> {
    let raw = store
        .get(&report_key(id))
        .await?
        .filter(|raw| !raw.is_empty())
        .ok_or(AppError::NotFound)?;

    let record: ReportRecord =
        serde_json::from_str(&raw).context("stored report payload is not a valid record")?;

    if !tokens_match(&record.token, token) {
        return Err(AppError::InvalidToken);
    }
    Ok(record)
}

const AREA_CELL: &str = "padding:8px;border-bottom:1px solid #e5e7eb";

const STYLE: &str = "\
body{font-family:ui-sans-serif,system-ui,-apple-system,Segoe UI,Roboto,Arial;background:#f8fafc;margin:0;color:#0f172a}
.wrap{max-width:900px;margin:24px auto;padding:0 16px}
.card{background:white;border:1px solid #e2e8f0;border-radius:16px;box-shadow:0 1px 2px rgba(0,0,0,.05);overflow:hidden}
.head{padding:18px;border-bottom:1px solid #e2e8f0;display:flex;justify-content:space-between;gap:12px;align-items:flex-start}
.h1{font-size:18px;font-weight:900;margin:0}
.muted{font-size:12px;color:#64748b;margin-top:4px}
.grid{display:grid;grid-template-columns:1fr 1fr;gap:12px;padding:18px}
.box{border:1px solid #e2e8f0;border-radius:14px;padding:12px;background:#fff}
pre{white-space:pre-wrap;word-break:break-word;margin:0;font-size:13px;line-height:1.5}
table{width:100%;border-collapse:collapse;font-size:13px}
.btn{display:inline-block;background:#1e293b;color:white;text-decoration:none;padding:10px 12px;border-radius:12px;font-weight:800;font-size:13px}
@media (max-width:720px){.grid{grid-template-columns:1fr}}
@media print{body{background:white}.wrap{margin:0;max-width:none}}";

/// Renders the self-contained report page.
pub fn render_report(record: &ReportRecord) -> String {
    let company = escape_html(&record.company());
    let person = escape_html(&record.person());
    let created = escape_html(&record.created_at_local);
    let global_score = record
        .global_score
        .map(|score| escape_html(&score.to_string()))
        .unwrap_or_default();
    let analysis = escape_html(&record.ai_analysis);

    let area_rows: String = record
        .scores_by_area
        .iter()
        .map(|(area, score)| {
            format!(
                r#"<tr><td style="{AREA_CELL}">{}</td><td style="{AREA_CELL};text-align:right;font-weight:700">{}/100</td></tr>"#,
                escape_html(area),
                escape_html(&score_text(score)),
            )
        })
        .collect();

    format!(
        r#"<!doctype html>
<html lang="es"><head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1" />
<title>Reporte | {company}</title>
<style>
{STYLE}
</style></head>
<body><div class="wrap">
  <div class="card">
    <div class="head">
      <div>
        <p class="h1">Reporte Ejecutivo — Pre-diagnóstico Organizacional</p>
        <div class="muted">{company} · {person} · {created}</div>
      </div>
      <a class="btn" href="javascript:window.print()">Imprimir / Guardar PDF</a>
    </div>

    <div class="grid">
      <div class="box">
        <div style="font-size:12px;color:#64748b;font-weight:800">Puntuación global</div>
        <div style="font-size:36px;font-weight:950;margin-top:6px">{global_score}/100</div>
      </div>
      <div class="box">
        <div style="font-size:12px;color:#64748b;font-weight:800;margin-bottom:8px">Puntuación por área</div>
        <table>{area_rows}</table>
      </div>
    </div>

    <div style="padding:18px;border-top:1px solid #e2e8f0">
      <div style="font-size:12px;color:#64748b;font-weight:800;margin-bottom:8px">Análisis con IA</div>
      <div class="box"><pre>{analysis}</pre></div>
    </div>
  </div>
</div></body></html>"#
    )
}
