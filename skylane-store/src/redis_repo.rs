use redis::{AsyncCommands, RedisResult};
use tracing::info;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: i64,
        window_seconds: i64,
    ) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }

    /// Puts a session token id on the denylist until the token would have
    /// expired anyway.
    pub async fn revoke_session(&self, token_id: &str, ttl_seconds: u64) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("session:revoked:{}", token_id);
        conn.set_ex::<_, _, ()>(key, 1, ttl_seconds).await?;
        info!("Session revoked: {}", token_id);
        Ok(())
    }

    pub async fn is_session_revoked(&self, token_id: &str) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("session:revoked:{}", token_id);
        let revoked: bool = conn.exists(key).await?;
        Ok(revoked)
    }
}
