//! Persisted exchange rate records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

use crate::core::quote::Quote;

/// A rate as stored, with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRate {
    pub id: u64,
    pub code: String,
    pub bid: Decimal,
    pub ask: Decimal,
    pub timestamp: i64,
    pub created_at: DateTime<Utc>,
}

/// A rate ready to be handed to a [`crate::store::RateStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRate {
    pub code: String,
    pub bid: Decimal,
    pub ask: Decimal,
    pub timestamp: i64,
    pub created_at: DateTime<Utc>,
}

impl NewRate {
    /// Converts the string fields of a quote. A bid, ask or timestamp that
    /// does not parse is stored as zero.
    pub fn from_quote(quote: &Quote) -> Self {
        let q = &quote.usdbrl;
        NewRate {
            code: q.code.clone().unwrap_or_default(),
            bid: parse_decimal("bid", q.bid.as_deref()),
            ask: parse_decimal("ask", q.ask.as_deref()),
            timestamp: parse_timestamp(q.timestamp.as_deref()),
            created_at: Utc::now(),
        }
    }

    pub fn with_id(self, id: u64) -> StoredRate {
        StoredRate {
            id,
            code: self.code,
            bid: self.bid,
            ask: self.ask,
            timestamp: self.timestamp,
            created_at: self.created_at,
        }
    }
}

fn parse_decimal(field: &str, value: Option<&str>) -> Decimal {
    let raw = value.unwrap_or_default();
    Decimal::from_str(raw.trim()).unwrap_or_else(|e| {
        warn!(field, value = raw, error = %e, "Could not parse decimal, storing zero");
        Decimal::ZERO
    })
}

fn parse_timestamp(value: Option<&str>) -> i64 {
    let raw = value.unwrap_or_default();
    raw.trim().parse::<i64>().unwrap_or_else(|e| {
        warn!(field = "timestamp", value = raw, error = %e, "Could not parse timestamp, storing zero");
        0
    })
}
