//! Redis Store Module
//!
//! `KeyValueStore` over a single Redis instance. The connection is opened
//! lazily and re-attempted on the next call after a failure, so a Redis
//! outage at startup only degrades the cache.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError, RedisResult};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::cache::KeyValueStore;
use crate::error::{StoreError, StoreResult};

// == Redis Store ==
pub struct RedisStore {
    client: Client,
    conn: RwLock<Option<ConnectionManager>>,
    /// Held by the single task currently dialing Redis
    connecting: Mutex<()>,
    /// Upper bound on every round-trip, connection setup included
    timeout: Duration,
}

impl RedisStore {
    // == Constructor ==
    /// Parses `url` without connecting.
    pub fn open(url: &str, timeout: Duration) -> StoreResult<Self> {
        let client = Client::open(url).map_err(|e| StoreError::Command {
            op: "OPEN",
            message: e.to_string(),
        })?;

        Ok(Self {
            client,
            conn: RwLock::new(None),
            connecting: Mutex::new(()),
            timeout,
        })
    }

    /// Returns the shared connection, dialing it on first use.
    ///
    /// Only one task dials at a time. Callers arriving while a dial is in
    /// flight fail with `Unavailable` instead of queueing behind it, so no
    /// call waits longer than one timeout.
    async fn connection(&self) -> StoreResult<ConnectionManager> {
        if let Some(conn) = self.conn.read().await.as_ref() {
            return Ok(conn.clone());
        }

        let Ok(_dialing) = self.connecting.try_lock() else {
            debug!("Redis connection attempt already in progress");
            return Err(StoreError::Unavailable {
                op: "CONNECT",
                message: "connection attempt already in progress".to_string(),
            });
        };

        // Another task may have finished dialing before we took the lock
        if let Some(conn) = self.conn.read().await.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self
            .bounded("CONNECT", ConnectionManager::new(self.client.clone()))
            .await?;
        info!("Connected to Redis");
        *self.conn.write().await = Some(conn.clone());
        Ok(conn)
    }

    /// Runs one Redis future under the configured timeout.
    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(self.classify(op, err)),
            Err(_) => Err(StoreError::Timeout {
                op,
                after: self.timeout,
            }),
        }
    }

    fn classify(&self, op: &'static str, err: RedisError) -> StoreError {
        if err.is_timeout() {
            StoreError::Timeout {
                op,
                after: self.timeout,
            }
        } else if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            StoreError::Unavailable {
                op,
                message: err.to_string(),
            }
        } else {
            StoreError::Command {
                op,
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.connection().await?;
        self.bounded("GET", conn.get::<_, Option<String>>(key)).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        // EX takes whole seconds and rejects zero
        let seconds = ttl.as_secs().max(1);
        let mut conn = self.connection().await?;
        self.bounded("SET", conn.set_ex::<_, _, ()>(key, value, seconds))
            .await
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.connection().await?;
        let removed = self.bounded("DEL", conn.del::<_, u64>(key)).await?;
        Ok(removed > 0)
    }

    async fn delete_many(&self, keys: &[String]) -> StoreResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection().await?;
        self.bounded("DEL", conn.del::<_, u64>(keys)).await
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.connection().await?;
        self.bounded("KEYS", conn.keys::<_, Vec<String>>(pattern))
            .await
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_open_rejects_invalid_url() {
        let result = RedisStore::open("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(StoreError::Command { op: "OPEN", .. })));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_store_error() {
        // Port 1 on loopback refuses connections on any normal host
        let store = RedisStore::open("redis://127.0.0.1:1/0", Duration::from_millis(500)).unwrap();

        let err = store.get("product:1").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Unavailable { .. } | StoreError::Timeout { .. }
        ));
        assert!(store.conn.read().await.is_none());
    }

    #[tokio::test]
    async fn test_silent_server_does_not_stack_timeouts() {
        // Accepts connections and never answers, like a black-holed Redis
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let timeout = Duration::from_millis(300);
        let url = format!("redis://127.0.0.1:{}/1", port);
        let store = Arc::new(RedisStore::open(&url, timeout).unwrap());

        let mut calls = tokio::task::JoinSet::new();
        for i in 0..8 {
            let store = store.clone();
            calls.spawn(async move {
                let started = Instant::now();
                let result = store.get(&format!("product:{}", i)).await;
                (started.elapsed(), result)
            });
        }

        while let Some(joined) = calls.join_next().await {
            let (elapsed, result) = joined.unwrap();
            assert!(result.is_err());
            assert!(
                elapsed < timeout * 2,
                "single call took {:?} with a {:?} timeout",
                elapsed,
                timeout
            );
        }

        silent.abort();
    }
}
