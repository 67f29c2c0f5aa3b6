use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;

use super::{ReportStore, StoreError};

/// Upstash-compatible KV REST client (`/setex/...`, `/get/...` with a bearer token).
#[derive(Clone)]
pub struct RestKvStore {
    client: Client,
    base_url: String,
    token: String,
}

impl RestKvStore {
    pub fn new(client: Client, base_url: &str, token: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn setex_url(&self, key: &str, ttl_seconds: u64, value: &str) -> String {
        format!(
            "{}/setex/{}/{}/{}",
            self.base_url,
            urlencoding::encode(key),
            ttl_seconds,
            urlencoding::encode(value)
        )
    }

    fn get_url(&self, key: &str) -> String {
        format!("{}/get/{}", self.base_url, urlencoding::encode(key))
    }

    async fn send(&self, url: String) -> Result<Response, StoreError> {
        Ok(self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?)
    }
}

/// Decodes the JSON reply; an unreadable body counts as an empty object.
async fn read_reply(response: Response, op: &str) -> Result<Value, StoreError> {
    let status = response.status();
    let data = response
        .json::<Value>()
        .await
        .unwrap_or_else(|_| Value::Object(Default::default()));

    if !status.is_success() {
        let message = data
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("KV {op} failed: {}", status.as_u16()));
        return Err(StoreError::Rejected(message));
    }
    Ok(data)
}

/// `{"result": "<payload>"}` or `{"result": null}` for a missing/expired key.
async fn read_get_reply(response: Response) -> Result<Option<String>, StoreError> {
    let data = read_reply(response, "GET").await?;
    Ok(data
        .get("result")
        .and_then(Value::as_str)
        .map(str::to_owned))
}

#[async_trait]
impl ReportStore for RestKvStore {
    async fn set_ex(&self, key: &str, ttl_seconds: u64, value: &str) -> Result<(), StoreError> {
        let response = self.send(self.setex_url(key, ttl_seconds, value)).await?;
        read_reply(response, "SETEX").await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let response = self.send(self.get_url(key)).await?;
        read_get_reply(response).await
    }
}
