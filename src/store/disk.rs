use crate::core::rate::{NewRate, StoredRate};
use crate::store::{RATES_PARTITION, RateStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Rates persisted in a fjall partition, keyed by big-endian id.
pub struct FjallRateStore {
    // Kept alive for the lifetime of the partition
    _keyspace: Keyspace,
    partition: PartitionHandle,
    next_id: Mutex<u64>,
}

impl FjallRateStore {
    /// Opens the keyspace and provisions the rates partition if missing.
    pub fn open(db_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(db_path)
            .with_context(|| format!("Failed to create data directory: {}", db_path.display()))?;

        let keyspace = Config::new(db_path)
            .open()
            .with_context(|| format!("Failed to open keyspace at {}", db_path.display()))?;
        let partition = keyspace
            .open_partition(RATES_PARTITION, PartitionCreateOptions::default())
            .with_context(|| format!("Failed to open partition {RATES_PARTITION}"))?;

        let last_id = match partition.last_key_value()? {
            Some((key, _)) => decode_id(&key)?,
            None => 0,
        };
        info!(
            path = %db_path.display(),
            partition = RATES_PARTITION,
            last_id,
            "Rate store ready"
        );

        Ok(Self {
            _keyspace: keyspace,
            partition,
            next_id: Mutex::new(last_id + 1),
        })
    }
}

fn decode_id(key: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = key
        .try_into()
        .with_context(|| format!("Malformed rate key of {} bytes", key.len()))?;
    Ok(u64::from_be_bytes(bytes))
}

#[async_trait]
impl RateStore for FjallRateStore {
    async fn create(&self, rate: NewRate) -> Result<StoredRate> {
        // Holding the lock across the insert keeps ids and write order aligned
        let mut next_id = self
            .next_id
            .lock()
            .map_err(|_| anyhow::anyhow!("Rate id sequence lock poisoned"))?;
        let stored = rate.with_id(*next_id);
        self.partition
            .insert(stored.id.to_be_bytes().as_slice(), serde_json::to_vec(&stored)?)
            .context("Failed to insert rate")?;
        *next_id += 1;
        debug!(id = stored.id, "Rate inserted");
        Ok(stored)
    }

    async fn all(&self) -> Result<Vec<StoredRate>> {
        let mut rates = Vec::new();
        for item in self.partition.iter() {
            let (_, value) = item?;
            rates.push(serde_json::from_slice(&value)?);
        }
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::quote::{Quote, UsdBrl};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::tempdir;

    fn new_rate(bid: &str) -> NewRate {
        NewRate::from_quote(&Quote {
            usdbrl: UsdBrl {
                code: Some("USD".to_string()),
                bid: Some(bid.to_string()),
                ask: Some("5.4325".to_string()),
                timestamp: Some("1700000000".to_string()),
                ..Default::default()
            },
        })
    }

    #[tokio::test]
    async fn test_fjall_store_create_and_list() {
        let dir = tempdir().unwrap();
        let store = FjallRateStore::open(dir.path()).unwrap();

        // Freshly provisioned partition is empty
        assert!(store.all().await.unwrap().is_empty());

        let first = store.create(new_rate("5.4321")).await.unwrap();
        let second = store.create(new_rate("5.5000")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let all = store.all().await.unwrap();
        assert_eq!(all, vec![first, second]);
        assert_eq!(all[0].bid, Decimal::from_str("5.4321").unwrap());
        assert_eq!(all[0].timestamp, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_fjall_store_resumes_id_sequence() {
        let dir = tempdir().unwrap();
        {
            let store = FjallRateStore::open(dir.path()).unwrap();
            store.create(new_rate("5.1")).await.unwrap();
            store.create(new_rate("5.2")).await.unwrap();
        }

        let store = FjallRateStore::open(dir.path()).unwrap();
        let third = store.create(new_rate("5.3")).await.unwrap();
        assert_eq!(third.id, 3);
        assert_eq!(store.all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_fjall_store_keeps_zeroed_fields() {
        let dir = tempdir().unwrap();
        let store = FjallRateStore::open(dir.path()).unwrap();

        let stored = store.create(new_rate("abc")).await.unwrap();
        assert_eq!(stored.bid, Decimal::ZERO);

        let all = store.all().await.unwrap();
        assert_eq!(all[0].bid, Decimal::ZERO);
        assert_eq!(all[0].ask, Decimal::from_str("5.4325").unwrap());
    }

    #[test]
    fn test_decode_id_rejects_short_keys() {
        assert!(decode_id(&[1, 2, 3]).is_err());
        assert_eq!(decode_id(&42u64.to_be_bytes()).unwrap(), 42);
    }
}
