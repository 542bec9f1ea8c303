//! The upstream USD-BRL quote payload

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::error::FetchError;

/// Envelope returned by the quote provider, keyed by currency pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(rename = "USDBRL")]
    pub usdbrl: UsdBrl,
}

/// Quote fields exactly as the provider sends them.
///
/// Every value is a string on the wire and is kept that way here; numeric
/// interpretation only happens when a [`crate::core::rate::NewRate`] is built.
/// Fields missing from the payload are left out when re-serializing. An
/// explicit `null` is treated like a missing field, so it is dropped from the
/// response rather than echoed back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsdBrl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codein: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<String>,
    #[serde(
        rename = "varBid",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub var_bid: Option<String>,
    #[serde(
        rename = "pctChange",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pct_change: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_date: Option<String>,
}

impl Quote {
    pub fn bid(&self) -> &str {
        self.usdbrl.bid.as_deref().unwrap_or_default()
    }
}

/// Source of the current USD-BRL quote.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self) -> Result<Quote, FetchError>;
}
