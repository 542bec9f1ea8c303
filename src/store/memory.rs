use crate::core::rate::{NewRate, StoredRate};
use crate::store::RateStore;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory rate store with an optional artificial write latency
#[derive(Clone, Default)]
pub struct MemoryRateStore {
    inner: Arc<Mutex<Vec<StoredRate>>>,
    latency: Duration,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `create` sleeps for `latency` before taking the write lock.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            inner: Arc::default(),
            latency,
        }
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn create(&self, rate: NewRate) -> Result<StoredRate> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut rates = self.inner.lock().await;
        let stored = rate.with_id(rates.len() as u64 + 1);
        rates.push(stored.clone());
        debug!(id = stored.id, "Rate stored in memory");
        Ok(stored)
    }

    async fn all(&self) -> Result<Vec<StoredRate>> {
        Ok(self.inner.lock().await.clone())
    }
}
