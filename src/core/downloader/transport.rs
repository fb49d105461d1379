//! Resumable HTTP transfer into a `.part` file.
//!
//! The existing partial file's length is the resume offset. A 206 response is
//! appended, a 200 response rewrites the file from scratch, and a 416 (the
//! partial file is longer than the remote resource) discards the partial file
//! and restarts from zero once.

use std::path::Path;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::{Client, StatusCode};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

const MAX_ATTEMPTS: usize = 2;

/// Fetch `url` into `part_path`, resuming from its current length.
///
/// Returns the number of bytes written by this call.
pub async fn fetch_resumable(
    client: &Client,
    url: &str,
    part_path: &Path,
    cancel: &CancellationToken,
) -> LauncherResult<u64> {
    let mut offset = partial_len(part_path).await?;

    for _ in 0..MAX_ATTEMPTS {
        if cancel.is_cancelled() {
            return Err(LauncherError::Cancelled);
        }

        let mut request = client.get(url);
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={}-", offset));
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(LauncherError::Cancelled),
            response = request.send() => response?,
        };

        let append = match response.status() {
            StatusCode::RANGE_NOT_SATISFIABLE => {
                debug!("{} rejected range at {}, restarting from zero", url, offset);
                remove_partial(part_path).await?;
                offset = 0;
                continue;
            }
            StatusCode::PARTIAL_CONTENT if offset > 0 => {
                check_resume_position(url, offset, &response)?;
                true
            }
            StatusCode::OK | StatusCode::PARTIAL_CONTENT => false,
            status => {
                return Err(LauncherError::DownloadFailed {
                    url: url.to_string(),
                    status: status.as_u16(),
                })
            }
        };

        let mut options = OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let mut file = options
            .open(part_path)
            .await
            .map_err(|e| LauncherError::io(part_path, e))?;

        // Dropping `stream` on cancellation closes the connection.
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        loop {
            let chunk = tokio::select! {
                _ = cancel.cancelled() => {
                    if let Err(e) = file.flush().await {
                        debug!("Flushing {:?} on cancellation failed: {}", part_path, e);
                    }
                    return Err(LauncherError::Cancelled);
                }
                chunk = stream.next() => chunk,
            };
            let Some(chunk) = chunk else { break };
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| LauncherError::io(part_path, e))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| LauncherError::io(part_path, e))?;

        debug!(
            "Fetched {} bytes of {} ({})",
            written,
            url,
            if append { "resumed" } else { "full" }
        );
        return Ok(written);
    }

    Err(LauncherError::RangeNotSatisfiable {
        url: url.to_string(),
    })
}

async fn partial_len(part_path: &Path) -> LauncherResult<u64> {
    match tokio::fs::metadata(part_path).await {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(LauncherError::io(part_path, e)),
    }
}

async fn remove_partial(part_path: &Path) -> LauncherResult<()> {
    match tokio::fs::remove_file(part_path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(LauncherError::io(part_path, e)),
    }
}

/// A 206 must continue exactly where the partial file ends.
fn check_resume_position(url: &str, offset: u64, response: &reqwest::Response) -> LauncherResult<()> {
    let Some(header) = response
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
    else {
        return Ok(());
    };

    match parse_content_range_start(header) {
        Some(start) if start == offset => Ok(()),
        _ => Err(LauncherError::Other(format!(
            "resume position mismatch for {url}: asked for {offset}, got {header:?}"
        ))),
    }
}

/// `bytes start-end/total` → `start`
fn parse_content_range_start(header: &str) -> Option<u64> {
    let range = header.strip_prefix("bytes ")?;
    let (span, _total) = range.split_once('/')?;
    let (start, _end) = span.split_once('-')?;
    start.trim().parse().ok()
}
