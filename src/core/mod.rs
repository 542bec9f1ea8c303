//! Core types shared by the service and the client

pub mod config;
pub mod error;
pub mod log;
pub mod quote;
pub mod rate;

// Re-export main types for cleaner imports
pub use error::{ClientError, FetchError};
pub use quote::{Quote, QuoteProvider, UsdBrl};
pub use rate::{NewRate, StoredRate};
