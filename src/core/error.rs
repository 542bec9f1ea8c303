//! Error kinds surfaced by the upstream fetch and the local client

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream request timed out after {0} ms")]
    Timeout(u128),
    #[error("upstream transport error: {0}")]
    Transport(reqwest::Error),
    #[error("upstream returned HTTP {0}")]
    BadStatus(reqwest::StatusCode),
    #[error("failed to decode upstream quote: {0}")]
    Decode(serde_json::Error),
}

impl FetchError {
    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout(_) => "timeout",
            FetchError::Transport(_) => "transport",
            FetchError::BadStatus(_) => "bad_status",
            FetchError::Decode(_) => "decode",
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u128 },
    #[error("request to {url} failed: {err}")]
    Transport { url: String, err: reqwest::Error },
    #[error("server returned HTTP {0}")]
    BadStatus(reqwest::StatusCode),
    #[error("failed to read response body: {0}")]
    Body(reqwest::Error),
    #[error("failed to parse response: {0}")]
    Decode(serde_json::Error),
    #[error("failed to create file {}: {err}", .path.display())]
    FileCreate {
        path: PathBuf,
        err: std::io::Error,
    },
    #[error("failed to write file {}: {err}", .path.display())]
    FileWrite {
        path: PathBuf,
        err: std::io::Error,
    },
}
