//! Read-only GETs against third-party sites.
//!
//! Every failure (transport error, non-success status, undecodable body)
//! collapses to `None`; the reason is only logged.

use {reqwest::Client, serde::de::DeserializeOwned, tracing::debug};

pub(crate) const USER_AGENT: &str = concat!("beeline/", env!("CARGO_PKG_VERSION"));

pub(crate) async fn get_text(client: &Client, url: &str, headers: &[(&str, &str)]) -> Option<String> {
    let mut req = client.get(url);
    for (name, value) in headers {
        req = req.header(*name, *value);
    }
    let resp = match req.send().await {
        Ok(resp) => resp,
        Err(e) => {
            debug!(url, error = %e, "fetch failed");
            return None;
        },
    };
    if !resp.status().is_success() {
        debug!(url, status = %resp.status(), "fetch returned non-success status");
        return None;
    }
    match resp.text().await {
        Ok(body) => Some(body),
        Err(e) => {
            debug!(url, error = %e, "failed to read response body");
            None
        },
    }
}

pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    headers: &[(&str, &str)],
) -> Option<T> {
    let body = get_text(client, url, headers).await?;
    match serde_json::from_str(&body) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(url, error = %e, "response is not the expected JSON shape");
            None
        },
    }
}
