//! Image host seam.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::uploads::ImageFile;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("image host rejected the upload with status {status}")]
    Rejected { status: u16 },
    #[error("image host response did not contain an image URL")]
    MissingUrl,
}

impl UploadError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Uploads one image and yields its public URL.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, file: &ImageFile) -> Result<String, UploadError>;
}
