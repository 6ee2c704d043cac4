//! Local image files selected for upload.

use bytes::Bytes;

const IMAGE_PREFIX: &str = "image/";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A file picked by the operator, with its content type resolved from the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageFile {
    /// Guess the content type from the file name extension.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_raw()
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();
        Self {
            file_name,
            content_type,
            bytes: bytes.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        is_image_content_type(&self.content_type)
    }
}

/// Only `image/*` files are eligible for the image host.
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type.starts_with(IMAGE_PREFIX)
}
