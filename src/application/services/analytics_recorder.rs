//! Analytics Recorder
//!
//! Best-effort counter updates. A failing counter store is logged and
//! otherwise ignored.

use std::sync::Arc;
use tracing::warn;

use crate::domain::{AnalyticsCounter, AnalyticsRepository};

#[derive(Clone)]
pub struct AnalyticsRecorder {
    repo: Arc<dyn AnalyticsRepository>,
}

impl AnalyticsRecorder {
    pub fn new(repo: Arc<dyn AnalyticsRepository>) -> Self {
        Self { repo }
    }

    pub async fn record(&self, counter: AnalyticsCounter) {
        let key = counter.key();
        if let Err(e) = self.repo.increment(&key, 1).await {
            warn!(key = %key, error = %e, "Failed to record analytics counter");
        }
    }

    pub async fn record_all<I>(&self, counters: I)
    where
        I: IntoIterator<Item = AnalyticsCounter>,
    {
        for counter in counters {
            self.record(counter).await;
        }
    }

    /// Read counters; unreadable values come back as zero.
    pub async fn read(&self, counters: &[AnalyticsCounter]) -> Vec<i64> {
        let keys: Vec<String> = counters.iter().map(AnalyticsCounter::key).collect();
        match self.repo.get_many(&keys).await {
            Ok(values) if values.len() == keys.len() => values,
            Ok(_) => vec![0; keys.len()],
            Err(e) => {
                warn!(error = %e, "Failed to read analytics counters");
                vec![0; keys.len()]
            }
        }
    }
}
