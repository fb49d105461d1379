use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

const APP_USER_AGENT: &str = concat!("LauncherFetch/", env!("CARGO_PKG_VERSION"));
const MAX_ATTEMPTS: u32 = 3;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Longest silence tolerated between two reads on one response.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared client. `identity` encoding keeps range offsets in raw bytes.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    build_http_client_with_read_timeout(READ_TIMEOUT)
}

pub(crate) fn build_http_client_with_read_timeout(
    read_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(read_timeout)
        .build()
}

/// GET a small document (catalog, manifest, asset index) into memory.
///
/// Connection errors and 5xx responses are retried with exponential backoff;
/// any other non-success status fails immediately.
pub async fn get_bytes(client: &Client, url: &str) -> LauncherResult<Vec<u8>> {
    let mut last_err = None;

    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            let delay = Duration::from_secs(2u64.pow(attempt));
            debug!("Retrying {} in {:?} (attempt {})", url, delay, attempt + 1);
            tokio::time::sleep(delay).await;
        }

        let response = match client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("GET {} failed: {}", url, e);
                last_err = Some(LauncherError::Http(e));
                continue;
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response.bytes().await?.to_vec());
        }

        let err = LauncherError::DownloadFailed {
            url: url.to_string(),
            status: status.as_u16(),
        };
        if !status.is_server_error() {
            return Err(err);
        }
        warn!("GET {} returned {}", url, status);
        last_err = Some(err);
    }

    Err(last_err.unwrap_or_else(|| LauncherError::Other(format!("GET {url} was never attempted"))))
}
