use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client as RedisClient, Cmd};
use tokio::sync::OnceCell;

use super::{ReportStore, StoreError};

/// Native Redis backend, used when no KV REST endpoint is configured.
///
/// One multiplexed connection is opened on first use and shared by every
/// request afterwards; startup does not wait for Redis.
pub struct RedisStore {
    client: RedisClient,
    conn: OnceCell<MultiplexedConnection>,
}

impl RedisStore {
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            conn: OnceCell::new(),
        }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        let conn = self
            .conn
            .get_or_try_init(|| self.client.get_multiplexed_async_connection())
            .await?;
        Ok(conn.clone())
    }
}

fn setex_cmd(key: &str, ttl_seconds: u64, value: &str) -> Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value).arg("EX").arg(ttl_seconds);
    cmd
}

fn get_cmd(key: &str) -> Cmd {
    let mut cmd = redis::cmd("GET");
    cmd.arg(key);
    cmd
}

#[async_trait]
impl ReportStore for RedisStore {
    async fn set_ex(&self, key: &str, ttl_seconds: u64, value: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        setex_cmd(key, ttl_seconds, value)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        let value = get_cmd(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await?;
        Ok(value)
    }
}
