//! Shared blocking HTTP client. One client is built per run; every fetch is
//! a single attempt with no retry, failures surface to the caller.

use std::time::Duration;

use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

use crate::error::Result;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub fn build_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .cookie_store(true)
        .gzip(true)
        .default_headers(headers)
        .build()?;
    Ok(client)
}

pub fn fetch_html(client: &Client, url: &str) -> Result<String> {
    log::debug!("Opening URL: {url}");
    let response = client.get(url).send()?.error_for_status()?;
    Ok(response.text()?)
}

pub fn fetch_html_with_headers(client: &Client, url: &str, headers: HeaderMap) -> Result<String> {
    log::debug!("Opening URL: {url}");
    let response = client.get(url).headers(headers).send()?.error_for_status()?;
    Ok(response.text()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_with_defaults() {
        assert!(build_client().is_ok());
    }
}
