use chrono::{DateTime, Local, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The persisted report. Written once by the generator, read by the renderer,
/// removed only by store expiry.
///
/// Field names are camelCase on the wire so stored payloads stay readable by
/// every deployment sharing the key space.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub id: String,
    #[serde(default)]
    pub token: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_at_local: String,
    #[serde(default)]
    pub customer: Map<String, Value>,
    #[serde(default)]
    pub scores_by_area: Map<String, Value>,
    pub global_score: Option<f64>,
    #[serde(default)]
    pub ai_analysis: String,
}

impl ReportRecord {
    pub fn new(
        id: String,
        token: String,
        customer: Map<String, Value>,
        scores_by_area: Map<String, Value>,
        global_score: Option<f64>,
        ai_analysis: String,
    ) -> Self {
        let now = Utc::now().trunc_subsecs(3);
        Self {
            id,
            token,
            created_at: now,
            created_at_local: now
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            customer,
            scores_by_area,
            global_score,
            ai_analysis,
        }
    }

    /// Customer field as display text; empty, zero and missing values yield `None`.
    pub fn customer_text(&self, field: &str) -> Option<String> {
        match self.customer.get(field)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            Value::Bool(true) => Some("true".to_string()),
            _ => None,
        }
    }

    pub fn company(&self) -> String {
        self.customer_text("empresa")
            .unwrap_or_else(|| "Empresa".to_string())
    }

    pub fn person(&self) -> String {
        self.customer_text("nombre")
            .unwrap_or_else(|| "Cliente".to_string())
    }
}

/// Display form of a score value: numbers and strings as-is, null as empty.
pub fn score_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
