//! Redis-backed capped lists

use super::{trim_range, ListStore, StoreResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;

/// Capped lists stored in Redis
///
/// The push and the trim are sent as one `MULTI`/`EXEC` pipeline, so other
/// clients never observe the pushed element without its trim. Reconnection
/// is handled by the connection manager; each call clones the manager handle
/// and may run concurrently with any number of other calls.
#[derive(Clone)]
pub struct RedisListStore {
    url: String,
    connection: ConnectionManager,
}

impl RedisListStore {
    /// Connect to the Redis server at `url` (e.g. `redis://127.0.0.1:6379/0`)
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        log::debug!("Connected to redis");

        Ok(Self {
            url: url.to_string(),
            connection,
        })
    }

    /// Round-trip a `PING` to verify the server is reachable
    pub async fn ping(&self) -> StoreResult<()> {
        let mut connection = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut connection).await?;
        Ok(())
    }
}

#[async_trait]
impl ListStore for RedisListStore {
    async fn push_capped(&self, key: &str, payload: &[u8], max_size: i64) -> StoreResult<()> {
        let (start, stop) = trim_range(max_size);
        let mut connection = self.connection.clone();

        let () = redis::pipe()
            .atomic()
            .lpush(key, payload)
            .ignore()
            .ltrim(key, start, stop)
            .ignore()
            .query_async(&mut connection)
            .await?;

        Ok(())
    }

    fn describe(&self) -> String {
        format!("redis ({})", mask_url(&self.url))
    }
}

/// `url` with any credentials replaced by `***`, for logs and error messages
pub fn mask_url(url: &str) -> String {
    match url.rsplit_once('@') {
        Some((scheme_and_auth, host)) => {
            let scheme = scheme_and_auth
                .split_once("://")
                .map_or("redis", |(scheme, _)| scheme);
            format!("{}://***@{}", scheme, host)
        }
        None => url.to_string(),
    }
}
