mod client;
mod basic;
pub mod auth;

pub use client::HttpClient;
pub use basic::BasicClient;

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use tracing::debug;

/// Issues a GET through `client` and returns the response body.
///
/// A non-success status is an error carrying the status and the body text,
/// which is where the SIE API explains rejected tokens and unknown series.
pub async fn fetch_bytes<C: HttpClient>(
    client: &C,
    url: &str,
) -> Result<Bytes> {
    let url: reqwest::Url = url
        .parse()
        .with_context(|| format!("Invalid request URL '{url}'"))?;

    let resp = client.get_json(url).await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow!("Request failed with status {}: {}", status, body));
    }

    let bytes = resp.bytes().await?;
    debug!(bytes = bytes.len(), "Response body received");
    Ok(bytes)
}
