//! Edit form for a single post and its image upload batches.

use tracing::{debug, info, warn};

use crate::application::prompt::Prompt;
use crate::application::uploads::ImageUploader;
use crate::domain::error::DomainError;
use crate::domain::posts::{Post, PostDraft, PostPatch, PostStatus, ensure_description};
use crate::domain::uploads::ImageFile;

pub const UPLOAD_FAILED_NOTICE: &str = "Failed to upload image.";

/// Marker for an upload that has not resolved to a URL yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadToken(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSlot {
    Ready(String),
    Uploading(UploadToken),
}

impl ImageSlot {
    pub fn url(&self) -> Option<&str> {
        match self {
            ImageSlot::Ready(url) => Some(url),
            ImageSlot::Uploading(_) => None,
        }
    }
}

/// Editable copy of a post, kept apart from the list mirror until saved.
#[derive(Debug, Clone)]
pub struct PostEditForm {
    id: Option<i64>,
    description: String,
    status: PostStatus,
    images: Vec<ImageSlot>,
    next_token: u64,
}

impl Default for PostEditForm {
    fn default() -> Self {
        Self::blank()
    }
}

impl PostEditForm {
    /// Template for a new post.
    pub fn blank() -> Self {
        Self {
            id: None,
            description: String::new(),
            status: PostStatus::Pending,
            images: Vec::new(),
            next_token: 0,
        }
    }

    pub fn from_post(post: &Post) -> Self {
        Self {
            id: post.id,
            description: post.description.clone(),
            status: post.status,
            images: post.images.iter().cloned().map(ImageSlot::Ready).collect(),
            next_token: 0,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn status(&self) -> PostStatus {
        self.status
    }

    pub fn set_status(&mut self, status: PostStatus) {
        self.status = status;
    }

    pub fn images(&self) -> &[ImageSlot] {
        &self.images
    }

    pub fn is_uploading(&self) -> bool {
        self.images
            .iter()
            .any(|slot| matches!(slot, ImageSlot::Uploading(_)))
    }

    /// Append a placeholder for an upload about to start.
    pub fn begin_upload(&mut self) -> UploadToken {
        let token = UploadToken(self.next_token);
        self.next_token += 1;
        self.images.push(ImageSlot::Uploading(token));
        token
    }

    /// Swap the placeholder for its URL, keeping its position.
    pub fn resolve_upload(&mut self, token: UploadToken, url: String) -> bool {
        match self.position_of(token) {
            Some(index) => {
                self.images[index] = ImageSlot::Ready(url);
                true
            }
            None => false,
        }
    }

    pub fn fail_upload(&mut self, token: UploadToken) -> bool {
        match self.position_of(token) {
            Some(index) => {
                self.images.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove a resolved image; placeholders cannot be removed by hand.
    pub fn remove_image(&mut self, index: usize) -> bool {
        if matches!(self.images.get(index), Some(ImageSlot::Ready(_))) {
            self.images.remove(index);
            true
        } else {
            false
        }
    }

    /// Build the payload to persist.
    ///
    /// Pending placeholders are dropped rather than awaited.
    pub fn submit(&self) -> Result<PostSubmission, DomainError> {
        ensure_description(&self.description)?;
        Ok(PostSubmission {
            id: self.id,
            description: self.description.trim().to_string(),
            status: self.status,
            images: self
                .images
                .iter()
                .filter_map(|slot| slot.url().map(str::to_string))
                .collect(),
        })
    }

    fn position_of(&self, token: UploadToken) -> Option<usize> {
        self.images
            .iter()
            .position(|slot| *slot == ImageSlot::Uploading(token))
    }
}

/// Validated form contents ready for the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSubmission {
    pub id: Option<i64>,
    pub description: String,
    pub status: PostStatus,
    pub images: Vec<String>,
}

impl PostSubmission {
    pub fn draft(&self) -> PostDraft {
        PostDraft {
            description: self.description.clone(),
            status: self.status,
            images: self.images.clone(),
        }
    }

    pub fn patch(&self) -> PostPatch {
        PostPatch {
            description: Some(self.description.clone()),
            status: Some(self.status),
            images: Some(self.images.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadBatchReport {
    pub uploaded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Upload `files` one at a time in selection order.
///
/// Non-image files are skipped silently. A failed file alerts once and loses
/// only its own placeholder; the rest of the batch is still attempted.
pub async fn upload_batch(
    form: &mut PostEditForm,
    uploader: &dyn ImageUploader,
    prompt: &dyn Prompt,
    files: Vec<ImageFile>,
) -> UploadBatchReport {
    let mut report = UploadBatchReport::default();

    for file in files {
        if !file.is_image() {
            debug!(
                file = %file.file_name,
                content_type = %file.content_type,
                "skipping non-image file"
            );
            report.skipped += 1;
            continue;
        }

        let token = form.begin_upload();
        match uploader.upload(&file).await {
            Ok(url) => {
                info!(file = %file.file_name, url = %url, "image uploaded");
                metrics::counter!("postdeck_upload_total", "outcome" => "success").increment(1);
                form.resolve_upload(token, url);
                report.uploaded += 1;
            }
            Err(err) => {
                warn!(file = %file.file_name, error = %err, "image upload failed");
                metrics::counter!("postdeck_upload_total", "outcome" => "failure").increment(1);
                form.fail_upload(token);
                prompt.alert(UPLOAD_FAILED_NOTICE);
                report.failed += 1;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::application::uploads::UploadError;

    #[derive(Default)]
    struct RecordingPrompt {
        alerts: Mutex<Vec<String>>,
    }

    impl Prompt for RecordingPrompt {
        fn alert(&self, message: &str) {
            self.alerts.lock().expect("lock").push(message.to_string());
        }

        fn confirm(&self, _message: &str) -> bool {
            true
        }
    }

    /// Fails any file whose name contains "bad"; records upload order.
    #[derive(Default)]
    struct ScriptedUploader {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageUploader for ScriptedUploader {
        async fn upload(&self, file: &ImageFile) -> Result<String, UploadError> {
            self.seen.lock().expect("lock").push(file.file_name.clone());
            if file.file_name.contains("bad") {
                Err(UploadError::Rejected { status: 400 })
            } else {
                Ok(format!("https://img.example/{}", file.file_name))
            }
        }
    }

    fn png(name: &str) -> ImageFile {
        ImageFile::new(name, vec![0u8; 4])
    }

    #[tokio::test]
    async fn failed_file_drops_only_its_placeholder() {
        let mut form = PostEditForm::blank();
        let uploader = ScriptedUploader::default();
        let prompt = RecordingPrompt::default();

        let report = upload_batch(
            &mut form,
            &uploader,
            &prompt,
            vec![png("one.png"), png("bad.png"), png("three.png")],
        )
        .await;

        assert_eq!(report.uploaded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(
            form.images(),
            &[
                ImageSlot::Ready("https://img.example/one.png".into()),
                ImageSlot::Ready("https://img.example/three.png".into()),
            ]
        );
        assert_eq!(*prompt.alerts.lock().expect("lock"), vec![UPLOAD_FAILED_NOTICE]);
        assert_eq!(
            *uploader.seen.lock().expect("lock"),
            vec!["one.png", "bad.png", "three.png"]
        );
    }

    #[tokio::test]
    async fn non_images_are_skipped_silently() {
        let mut form = PostEditForm::blank();
        let uploader = ScriptedUploader::default();
        let prompt = RecordingPrompt::default();

        let report = upload_batch(
            &mut form,
            &uploader,
            &prompt,
            vec![ImageFile::new("notes.txt", b"hi".to_vec()), png("a.png")],
        )
        .await;

        assert_eq!(report.skipped, 1);
        assert_eq!(report.uploaded, 1);
        assert!(prompt.alerts.lock().expect("lock").is_empty());
        assert_eq!(*uploader.seen.lock().expect("lock"), vec!["a.png"]);
    }

    #[test]
    fn submit_drops_pending_placeholders_and_trims() {
        let post = Post {
            id: Some(4),
            description: "  keep  ".into(),
            status: PostStatus::Rejected,
            images: vec!["https://a".into()],
            created_at: None,
            updated_at: None,
        };
        let mut form = PostEditForm::from_post(&post);
        let _pending = form.begin_upload();
        assert!(form.is_uploading());

        let submission = form.submit().expect("valid form");
        assert_eq!(submission.id, Some(4));
        assert_eq!(submission.description, "keep");
        assert_eq!(submission.status, PostStatus::Rejected);
        assert_eq!(submission.images, vec!["https://a".to_string()]);
    }

    #[test]
    fn whitespace_description_is_rejected() {
        let mut form = PostEditForm::blank();
        assert!(form.submit().is_err());
        form.set_description("   \n");
        assert!(form.submit().is_err());
        form.set_description("hello");
        let submission = form.submit().expect("valid");
        assert_eq!(submission.status, PostStatus::Pending);
        assert!(submission.images.is_empty());
    }

    #[test]
    fn placeholders_cannot_be_removed_by_hand() {
        let mut form = PostEditForm::blank();
        let token = form.begin_upload();
        assert!(!form.remove_image(0));
        assert!(form.resolve_upload(token, "https://x".into()));
        assert!(form.remove_image(0));
        assert!(form.images().is_empty());
    }
}
