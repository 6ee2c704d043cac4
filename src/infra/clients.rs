//! Wires credential bundles to the remote adapters.

use std::sync::Arc;

use reqwest::Client;

use crate::application::session::{ClientFactory, Session, SessionError};
use crate::config::{DataStoreSettings, ImageHostSettings};
use crate::domain::credentials::CredentialBundle;

use super::client::http_client;
use super::error::InfraError;
use super::imgbb::ImgbbUploader;
use super::postgrest::PostgrestPostsRepo;

pub struct RemoteClientFactory {
    client: Client,
    data_store: DataStoreSettings,
    image_host: ImageHostSettings,
}

impl RemoteClientFactory {
    pub fn new(
        data_store: DataStoreSettings,
        image_host: ImageHostSettings,
    ) -> Result<Self, InfraError> {
        Ok(Self {
            client: http_client()?,
            data_store,
            image_host,
        })
    }
}

impl ClientFactory for RemoteClientFactory {
    fn connect(&self, bundle: &CredentialBundle) -> Result<Session, SessionError> {
        let posts = PostgrestPostsRepo::new(
            self.client.clone(),
            &bundle.data_store.url,
            bundle.data_store.key.clone(),
            &self.data_store.rest_path,
            &self.data_store.table,
        )
        .map_err(SessionError::client)?;
        let uploader = ImgbbUploader::new(
            self.client.clone(),
            &self.image_host.endpoint,
            bundle.image_host.api_key.clone(),
        )
        .map_err(SessionError::client)?;

        Ok(Session {
            posts: Arc::new(posts),
            uploader: Arc::new(uploader),
        })
    }
}
