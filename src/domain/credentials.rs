//! Credential bundle decoded from the bootstrap QR code.
//!
//! The payload is persisted verbatim as a JSON object; the typed bundle is
//! only materialized when a session is initialized, so a payload that parses
//! as JSON but lacks one of the required sections is still stored and then
//! rejected at initialization time.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::DomainError;

/// Connection details for the hosted data store and the image host.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialBundle {
    pub data_store: DataStoreCredentials,
    pub image_host: ImageHostCredentials,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct DataStoreCredentials {
    pub url: String,
    pub key: String,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageHostCredentials {
    pub api_key: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBundle {
    #[serde(default, alias = "supabase")]
    data_store: Option<RawDataStore>,
    #[serde(default, alias = "imgbb")]
    image_host: Option<RawImageHost>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDataStore {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImageHost {
    #[serde(default)]
    api_key: Option<String>,
}

impl CredentialBundle {
    /// Validate a decoded payload and extract the typed bundle.
    ///
    /// Both the `dataStore` and `imageHost` sections are required. The key
    /// names used by older bundles (`supabase`, `imgbb`) are accepted too.
    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        if !value.is_object() {
            return Err(DomainError::validation("credential payload must be a JSON object"));
        }
        let raw: RawBundle = serde_json::from_value(value.clone())
            .map_err(|err| DomainError::validation(err.to_string()))?;

        let data_store = raw
            .data_store
            .ok_or(DomainError::missing_credential("dataStore"))?;
        let image_host = raw
            .image_host
            .ok_or(DomainError::missing_credential("imageHost"))?;

        Ok(Self {
            data_store: DataStoreCredentials {
                url: required(data_store.url, "dataStore.url")?,
                key: required(data_store.key, "dataStore.key")?,
            },
            image_host: ImageHostCredentials {
                api_key: required(image_host.api_key, "imageHost.apiKey")?,
            },
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, DomainError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(DomainError::missing_credential(field))
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("data_store_url", &self.data_store.url)
            .field("data_store_key", &"<redacted>")
            .field("image_host_api_key", &"<redacted>")
            .finish()
    }
}
