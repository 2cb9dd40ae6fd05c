use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use reqwest::{header, Client};
use schedule_core::{LoadError, Payload};

/// Appends a `t=<millis>` parameter so no cache between us and the
/// upstream answers with an old copy.
fn cache_busted(upstream: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis());
    let separator = if upstream.contains('?') { '&' } else { '?' };
    format!("{upstream}{separator}t={millis}")
}

/// Fetches and parses the dataset document. Transport errors, non-success
/// statuses and bodies that are not the expected JSON are all fetch
/// failures; missing parts are left for the decoder to reject.
pub async fn fetch_payload(client: &Client, upstream: &str) -> Result<Payload, LoadError> {
    let url = cache_busted(upstream);
    debug!("fetching {url}");

    let response = client
        .get(&url)
        .header(header::CACHE_CONTROL, "no-cache")
        .send()
        .await
        .map_err(|err| LoadError::Fetch(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Fetch(format!("upstream answered {status}")));
    }

    let body = response
        .text()
        .await
        .map_err(|err| LoadError::Fetch(err.to_string()))?;

    serde_json::from_str(&body).map_err(|err| LoadError::Fetch(format!("unreadable response: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_buster_respects_existing_query() {
        assert!(cache_busted("https://host/data.json").starts_with("https://host/data.json?t="));
        assert!(cache_busted("https://host/data?x=1").starts_with("https://host/data?x=1&t="));
    }
}
