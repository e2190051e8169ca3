//! Analytics counter stores.
//!
//! - `RedisAnalyticsStore` keeps counters as Redis integers (`INCRBY` / `MGET`)
//! - `MemoryAnalyticsStore` keeps them in a `DashMap` for local runs and tests

use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::AnalyticsRepository;
use crate::shared::error::AppError;

/// Redis-backed analytics counters.
#[derive(Clone)]
pub struct RedisAnalyticsStore {
    conn: ConnectionManager,
    prefix: Arc<str>,
}

impl RedisAnalyticsStore {
    /// Keys are stored as `"{prefix}:{key}"`.
    pub fn new(conn: ConnectionManager, prefix: impl Into<Arc<str>>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    fn format_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.prefix, key)
        }
    }
}

#[async_trait]
impl AnalyticsRepository for RedisAnalyticsStore {
    #[instrument(skip(self), level = "debug")]
    async fn increment(&self, key: &str, by: i64) -> Result<i64, AppError> {
        let full_key = self.format_key(key);
        let mut conn = self.conn.clone();

        let value = redis::cmd("INCRBY")
            .arg(&full_key)
            .arg(by)
            .query_async::<i64>(&mut conn)
            .await?;
        debug!(key = %full_key, value, "Counter incremented");

        Ok(value)
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_many(&self, keys: &[String]) -> Result<Vec<i64>, AppError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let full_keys: Vec<String> = keys.iter().map(|k| self.format_key(k)).collect();
        let mut conn = self.conn.clone();

        let values = redis::cmd("MGET")
            .arg(&full_keys)
            .query_async::<Vec<Option<i64>>>(&mut conn)
            .await?;

        Ok(values.into_iter().map(|v| v.unwrap_or(0)).collect())
    }
}

/// In-process analytics counters.
#[derive(Default)]
pub struct MemoryAnalyticsStore {
    counters: DashMap<String, i64>,
}

impl MemoryAnalyticsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalyticsRepository for MemoryAnalyticsStore {
    async fn increment(&self, key: &str, by: i64) -> Result<i64, AppError> {
        let mut entry = self.counters.entry(key.to_string()).or_insert(0);
        *entry += by;
        Ok(*entry)
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<i64>, AppError> {
        Ok(keys
            .iter()
            .map(|k| self.counters.get(k).map(|v| *v).unwrap_or(0))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_increment_and_read() {
        let store = MemoryAnalyticsStore::new();
        assert_eq!(store.increment("views", 1).await.unwrap(), 1);
        assert_eq!(store.increment("views", 2).await.unwrap(), 3);

        let values = store
            .get_many(&["views".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(values, vec![3, 0]);
    }

    #[tokio::test]
    async fn test_memory_concurrent_increments() {
        let store = Arc::new(MemoryAnalyticsStore::new());
        let handles: Vec<_> = (0..100)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.increment("k", 1).await.unwrap() })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.get_many(&["k".to_string()]).await.unwrap(), vec![100]);
    }
}
