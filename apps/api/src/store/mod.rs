//! Report persistence behind a minimal key-value capability.
//!
//! Two backends: the KV REST API (`RestKvStore`) used in serverless deployments,
//! and a native Redis connection (`RedisStore`) for self-hosted setups. Expiry is
//! always enforced by the store itself; nothing here deletes records.

use async_trait::async_trait;
use thiserror::Error;

pub mod redis;
pub mod rest;

pub use self::redis::RedisStore;
pub use self::rest::RestKvStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("KV request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    /// The store answered with a non-success status.
    #[error("{0}")]
    Rejected(String),
}

/// Single-key set-with-expiry and get. Atomicity of each call is the store's job.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn set_ex(&self, key: &str, ttl_seconds: u64, value: &str) -> Result<(), StoreError>;

    /// `None` covers both "never written" and "expired".
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
}

/// Storage key for a report id.
pub fn report_key(id: &str) -> String {
    format!("report:{id}")
}
