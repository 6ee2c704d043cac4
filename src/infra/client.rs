//! Shared HTTP client construction.

use reqwest::Client;
use url::Url;

use super::error::InfraError;

pub fn user_agent() -> &'static str {
    concat!("postdeck/", env!("CARGO_PKG_VERSION"))
}

pub fn http_client() -> Result<Client, InfraError> {
    Client::builder()
        .user_agent(user_agent())
        .build()
        .map_err(|err| InfraError::http(err.to_string()))
}

/// Parse `raw` as a base URL whose path ends in `/`, so relative joins append
/// instead of replacing the last segment.
pub fn base_url(raw: &str) -> Result<Url, InfraError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|err| InfraError::configuration(format!("invalid URL `{raw}`: {err}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
