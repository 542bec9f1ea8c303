//! Rate storage backends

pub mod disk;
pub mod memory;

use crate::core::rate::{NewRate, StoredRate};
use anyhow::Result;
use async_trait::async_trait;

pub use disk::FjallRateStore;
pub use memory::MemoryRateStore;

/// Name of the fjall partition holding USD-BRL rates.
pub const RATES_PARTITION: &str = "usd_brl_rates";

/// Append-only storage for exchange rates.
///
/// Implementations serialize their own writes; callers share a single handle
/// across tasks without extra locking.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Stores a rate and returns it with its generated id.
    async fn create(&self, rate: NewRate) -> Result<StoredRate>;

    /// All stored rates ordered by id.
    async fn all(&self) -> Result<Vec<StoredRate>>;
}
