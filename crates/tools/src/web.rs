use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Url};

use crate::html::extract_main_html;

pub const FETCH_FAILED: &str =
    "Could not retrieve content from the provided URL. Please check the URL and try again.";

/// Builds the reader address for `url`: `{reader_base}/{percent-encoded url}`.
pub fn reader_url(reader_base: &str, url: &str) -> Result<String> {
    let target = Url::parse(url.trim()).with_context(|| format!("invalid URL '{url}'"))?;
    if !matches!(target.scheme(), "http" | "https") {
        return Err(anyhow!("unsupported URL scheme '{}'", target.scheme()));
    }
    Ok(format!(
        "{}/{}",
        reader_base.trim_end_matches('/'),
        urlencoding::encode(target.as_str())
    ))
}

/// Fetches `url` through the reader proxy and returns the page's main HTML.
///
/// Failures are logged with their cause and surface as [`FETCH_FAILED`]
/// alone, so nothing of the URL leaks into the user-facing message.
pub async fn fetch_html(client: &Client, reader_base: &str, url: &str) -> Result<String> {
    fetch_raw(client, reader_base, url)
        .await
        .map(|text| extract_main_html(&text))
        .map_err(|e| {
            let detail = format!("{e:#}");
            tracing::warn!(error = %detail, %url, "reader fetch failed");
            anyhow!(FETCH_FAILED)
        })
}

async fn fetch_raw(client: &Client, reader_base: &str, url: &str) -> Result<String> {
    let address = reader_url(reader_base, url)?;
    tracing::debug!(%address, "fetching through reader");
    let resp = client.get(&address).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!(
            "Failed to fetch URL content. Status: {}",
            status.as_u16()
        ));
    }
    Ok(resp.text().await?)
}
