use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::info;

use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::{Completer, LlmClient, MODEL};
use crate::mailer::{Mailer, SendGridMailer};
use crate::store::{RedisStore, ReportStore, RestKvStore};

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Each external capability is `None` when its configuration is absent; the
/// handler that needs it answers with a configuration error instead.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub completer: Option<Arc<dyn Completer>>,
    pub store: Option<Arc<dyn ReportStore>>,
    pub mailer: Option<Arc<dyn Mailer>>,
}

impl AppState {
    /// Builds the outbound clients once, sharing one HTTP connection pool.
    pub fn from_config(config: Config) -> Result<Self> {
        // No client-side timeout: slow completions run until the upstream answers.
        let http = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        let completer: Option<Arc<dyn Completer>> = match &config.anthropic_api_key {
            Some(key) => {
                info!("LLM client initialized (model: {MODEL})");
                Some(Arc::new(LlmClient::new(http.clone(), key.clone())))
            }
            None => None,
        };

        let store: Option<Arc<dyn ReportStore>> =
            match (&config.kv_rest_url, &config.kv_rest_token, &config.redis_url) {
                (Some(url), Some(token), _) => {
                    info!("Report store: KV REST API");
                    Some(Arc::new(RestKvStore::new(http.clone(), url, token.clone())))
                }
                (_, _, Some(redis_url)) => {
                    let client = redis::Client::open(redis_url.as_str())
                        .context("REDIS_URL is not a valid Redis URL")?;
                    info!("Report store: Redis");
                    Some(Arc::new(RedisStore::new(client)))
                }
                _ => None,
            };

        let mailer: Option<Arc<dyn Mailer>> = match (&config.sendgrid_api_key, &config.from_email)
        {
            (Some(key), Some(from)) => Some(Arc::new(SendGridMailer::new(
                http.clone(),
                key.clone(),
                from.clone(),
            ))),
            _ => None,
        };

        for (name, ready) in [
            ("completion", completer.is_some()),
            ("report store", store.is_some()),
            ("mailer", mailer.is_some()),
        ] {
            if !ready {
                tracing::warn!("{name} not configured; dependent endpoints will fail");
            }
        }

        Ok(Self {
            config,
            completer,
            store,
            mailer,
        })
    }

    pub fn completer(&self) -> Result<&dyn Completer, AppError> {
        self.completer
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Missing ANTHROPIC_API_KEY".to_string()))
    }

    pub fn store(&self) -> Result<&dyn ReportStore, AppError> {
        self.store.as_deref().ok_or_else(|| {
            AppError::Configuration("Missing KV_REST_API_URL / KV_REST_API_TOKEN".to_string())
        })
    }

    pub fn mailer(&self) -> Result<&dyn Mailer, AppError> {
        self.mailer.as_deref().ok_or_else(|| {
            let missing = if self.config.sendgrid_api_key.is_none() {
                "SENDGRID_API_KEY"
            } else {
                "FROM_EMAIL"
            };
            AppError::Configuration(format!("Missing {missing}"))
        })
    }
}
