//! ImgBB-compatible image host adapter.

use async_trait::async_trait;
use postdeck_api_types::ImageHostResponse;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};
use url::Url;

use crate::application::uploads::{ImageUploader, UploadError};
use crate::domain::uploads::ImageFile;

use super::error::InfraError;

pub const DEFAULT_ENDPOINT: &str = "https://api.imgbb.com/1/upload";

pub struct ImgbbUploader {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl ImgbbUploader {
    pub fn new(client: Client, endpoint: &str, api_key: String) -> Result<Self, InfraError> {
        let endpoint = Url::parse(endpoint.trim()).map_err(|err| {
            InfraError::configuration(format!("invalid image host endpoint `{endpoint}`: {err}"))
        })?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    fn form(&self, file: &ImageFile) -> Result<Form, UploadError> {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(UploadError::transport)?;
        Ok(Form::new()
            .text("key", self.api_key.clone())
            .part("image", part))
    }
}

#[async_trait]
impl ImageUploader for ImgbbUploader {
    async fn upload(&self, file: &ImageFile) -> Result<String, UploadError> {
        debug!(
            file = %file.file_name,
            bytes = file.bytes.len(),
            content_type = %file.content_type,
            "uploading image"
        );
        let resp = self
            .client
            .post(self.endpoint.clone())
            .multipart(self.form(file)?)
            .send()
            .await
            .map_err(UploadError::transport)?;

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), file = %file.file_name, "image host rejected upload");
            return Err(UploadError::Rejected {
                status: status.as_u16(),
            });
        }

        let body: ImageHostResponse = resp.json().await.map_err(UploadError::transport)?;
        body.into_url().ok_or(UploadError::MissingUrl)
    }
}
