//! Local client: asks the quote service for the current rate and writes the
//! bid to a file.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::core::config::ClientConfig;
use crate::core::error::ClientError;
use crate::core::quote::Quote;

/// Line written to the output file for a given quote.
pub fn format_bid(quote: &Quote) -> String {
    format!("Dolar: {{{}}}", quote.bid())
}

/// Fetches a quote from the service, bounded by the configured timeout.
#[instrument(skip(config), fields(endpoint = %config.endpoint))]
pub async fn fetch_quote(config: &ClientConfig) -> Result<Quote, ClientError> {
    let timeout = config.timeout();
    match tokio::time::timeout(timeout, request(&config.endpoint)).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::Timeout {
            url: config.endpoint.clone(),
            timeout_ms: timeout.as_millis(),
        }),
    }
}

async fn request(url: &str) -> Result<Quote, ClientError> {
    let response = reqwest::get(url)
        .await
        .map_err(|err| ClientError::Transport {
            url: url.to_string(),
            err,
        })?;

    debug!(status = %response.status(), "Received service response");
    if !response.status().is_success() {
        return Err(ClientError::BadStatus(response.status()));
    }

    let body = response.bytes().await.map_err(ClientError::Body)?;
    serde_json::from_slice(&body).map_err(ClientError::Decode)
}

/// Overwrites `path` with the bid line.
pub fn write_bid(path: &Path, quote: &Quote) -> Result<(), ClientError> {
    let line = format_bid(quote);
    replace_file(path, |file| file.write_all(line.as_bytes()))
}

/// Writes into a temporary file next to `path` and renames it over `path`
/// once `write` succeeds. On any failure `path` keeps its previous content.
fn replace_file<F>(path: &Path, write: F) -> Result<(), ClientError>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|err| ClientError::FileCreate {
        path: path.to_path_buf(),
        err,
    })?;

    let write_err = |err: io::Error| ClientError::FileWrite {
        path: path.to_path_buf(),
        err,
    };
    write(tmp.as_file_mut())
        .and_then(|()| tmp.as_file_mut().flush())
        .map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Runs the client once. Any failure is reported on stderr and yields exit
/// code 1.
pub async fn run(config: &ClientConfig) -> ExitCode {
    let result = async {
        let quote = fetch_quote(config).await?;
        write_bid(&config.output_path, &quote)?;
        Ok::<_, ClientError>(quote)
    }
    .await;

    match result {
        Ok(quote) => {
            debug!(
                bid = quote.bid(),
                path = %config.output_path.display(),
                "Quote written"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            debug!(error = %e, "Client failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
