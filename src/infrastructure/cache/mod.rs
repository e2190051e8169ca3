//! Cache Module
//!
//! Redis connection management and the analytics counter stores.
//!
//! ```text
//! +-----------------------+
//! |  AnalyticsRecorder    |
//! +-----------------------+
//!            |
//!            v
//! +-----------------------+
//! |  AnalyticsRepository  |  <-- domain trait
//! +-----------------------+
//!       |           |
//!       v           v
//!  RedisAnalytics  MemoryAnalytics
//!  (ConnectionManager) (DashMap)
//! ```

mod analytics_store;

pub use analytics_store::{MemoryAnalyticsStore, RedisAnalyticsStore};

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;

/// Creates a Redis connection manager with automatic reconnection.
#[instrument(skip(settings))]
pub async fn create_redis_client(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.url.as_str())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Round-trip command used by the readiness probe.
pub async fn ping(conn: &ConnectionManager) -> Result<(), redis::RedisError> {
    let mut conn = conn.clone();
    redis::cmd("PING").query_async::<String>(&mut conn).await.map(|_| ())
}
