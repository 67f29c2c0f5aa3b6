use anyhow::{Context, Result};

use crate::errors::AppError;

/// Retention applied when `REPORT_TTL_DAYS` is unset or unparsable.
pub const DEFAULT_TTL_DAYS: i64 = 7;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Application configuration loaded from environment variables once at startup.
///
/// `PORT` and `RUST_LOG` are resolved immediately. Service credentials stay
/// optional here and are demanded by the handlers that use them, so a missing
/// mail key only fails report generation, never the completion proxy.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    pub admin_email: Option<String>,
    pub public_base_url: Option<String>,
    pub ttl_days: i64,
    pub kv_rest_url: Option<String>,
    pub kv_rest_token: Option<String>,
    pub redis_url: Option<String>,
    pub sendgrid_api_key: Option<String>,
    pub from_email: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            admin_email: optional_env("ADMIN_EMAIL"),
            public_base_url: optional_env("PUBLIC_BASE_URL"),
            ttl_days: parse_ttl_days(optional_env("REPORT_TTL_DAYS").as_deref()),
            kv_rest_url: optional_env("KV_REST_API_URL")
                .or_else(|| optional_env("UPSTASH_REDIS_REST_URL")),
            kv_rest_token: optional_env("KV_REST_API_TOKEN")
                .or_else(|| optional_env("UPSTASH_REDIS_REST_TOKEN")),
            redis_url: optional_env("REDIS_URL"),
            sendgrid_api_key: optional_env("SENDGRID_API_KEY"),
            from_email: optional_env("FROM_EMAIL"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Store expiry handed to the key-value store.
    pub fn ttl_seconds(&self) -> u64 {
        (self.ttl_days.max(1) as u64).saturating_mul(SECONDS_PER_DAY)
    }

    pub fn require_admin_email(&self) -> Result<&str, AppError> {
        require(&self.admin_email, "ADMIN_EMAIL")
    }

    pub fn require_public_base_url(&self) -> Result<&str, AppError> {
        require(&self.public_base_url, "PUBLIC_BASE_URL")
    }
}

fn require<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .ok_or_else(|| AppError::Configuration(format!("Missing {key}")))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parses `REPORT_TTL_DAYS` leniently: the leading integer is used (`"3.5"` is 3,
/// `"10d"` is 10), garbage falls back to the default and anything below one day is
/// raised to one, so the days reported to customers always match the store expiry.
fn parse_ttl_days(raw: Option<&str>) -> i64 {
    raw.and_then(leading_integer)
        .unwrap_or(DEFAULT_TTL_DAYS)
        .max(1)
}

/// Optional sign followed by decimal digits, ignoring leading whitespace and
/// anything after the digits.
fn leading_integer(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Overflowing values saturate instead of falling back to the default.
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

#[cfg(test)]
impl Config {
    /// Fully populated config for handler tests. No value points anywhere real.
    pub fn for_tests() -> Self {
        Config {
            anthropic_api_key: Some("test-anthropic-key".to_string()),
            admin_email: Some("admin@example.com".to_string()),
            public_base_url: Some("https://reports.example.com/".to_string()),
            ttl_days: DEFAULT_TTL_DAYS,
            kv_rest_url: None,
            kv_rest_token: None,
            redis_url: None,
            sendgrid_api_key: Some("test-sendgrid-key".to_string()),
            from_email: Some("noreply@example.com".to_string()),
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
