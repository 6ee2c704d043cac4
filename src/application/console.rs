//! Moderation console: the loaded feed page, its cursor and the write actions.
//!
//! Remote results are mirrored only after the store confirms them. Any failed
//! call raises one generic notice through the [`Prompt`] and leaves both the
//! list and the cursor untouched. Observers can [`Console::subscribe`] to a
//! revision counter that moves on every successful state change.

use std::num::NonZeroU32;
use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::application::editor::{PostEditForm, PostSubmission, UploadBatchReport, upload_batch};
use crate::application::pagination::PageCursor;
use crate::application::post_list::PostListState;
use crate::application::prompt::Prompt;
use crate::application::repos::{PostsRepo, RepoError};
use crate::application::session::Session;
use crate::application::uploads::ImageUploader;
use crate::domain::error::DomainError;
use crate::domain::posts::{Post, PostStatus, toggle_target};
use crate::domain::uploads::ImageFile;

pub const LOAD_FAILED_NOTICE: &str = "Failed to load posts.";
pub const CREATE_FAILED_NOTICE: &str = "Failed to add post.";
pub const UPDATE_FAILED_NOTICE: &str = "Failed to update post.";
pub const DELETE_FAILED_NOTICE: &str = "Failed to delete post.";
pub const STATUS_FAILED_NOTICE: &str = "Failed to update status.";
pub const EMPTY_DESCRIPTION_NOTICE: &str = "Please enter a post description";
pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this post?";

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Repository(#[from] RepoError),
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("post {0} not found")]
    NotFound(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
}

pub struct Console {
    repo: Arc<dyn PostsRepo>,
    uploader: Arc<dyn ImageUploader>,
    prompt: Arc<dyn Prompt>,
    posts: PostListState,
    cursor: PageCursor,
    revision: watch::Sender<u64>,
}

impl Console {
    pub fn new(session: &Session, prompt: Arc<dyn Prompt>, page_size: NonZeroU32) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            repo: Arc::clone(&session.posts),
            uploader: Arc::clone(&session.uploader),
            prompt,
            posts: PostListState::default(),
            cursor: PageCursor::new(page_size),
            revision,
        }
    }

    pub fn posts(&self) -> &PostListState {
        &self.posts
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    /// Revision counter bumped after each successful change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Reload the current page.
    pub async fn load_page(&mut self) -> Result<(), ConsoleError> {
        self.load_page_at(self.cursor.current_page()).await
    }

    /// Load `page`, clamped against the freshly counted total.
    pub async fn load_page_at(&mut self, page: u32) -> Result<(), ConsoleError> {
        let mut cursor = self.cursor;
        let result = async {
            let total = self.repo.count().await?;
            cursor.set_total(total);
            cursor.go_to(page);
            self.repo
                .list(cursor.current_page(), cursor.page_size())
                .await
        }
        .await;

        match result {
            Ok(rows) => {
                info!(
                    page = cursor.current_page(),
                    max_page = cursor.max_page(),
                    total = cursor.total_count(),
                    rows = rows.len(),
                    "feed page loaded"
                );
                self.cursor = cursor;
                self.posts.replace_page(rows);
                self.notify();
                Ok(())
            }
            Err(err) => Err(self.fail(LOAD_FAILED_NOTICE, err)),
        }
    }

    /// Returns `Ok(false)` when already on the last page.
    pub async fn next_page(&mut self) -> Result<bool, ConsoleError> {
        if !self.cursor.has_next() {
            return Ok(false);
        }
        self.load_page_at(self.cursor.current_page() + 1).await?;
        Ok(true)
    }

    /// Returns `Ok(false)` when already on the first page.
    pub async fn prev_page(&mut self) -> Result<bool, ConsoleError> {
        if !self.cursor.has_prev() {
            return Ok(false);
        }
        self.load_page_at(self.cursor.current_page() - 1).await?;
        Ok(true)
    }

    /// A post from the loaded page, or fetched by id when it is elsewhere.
    pub async fn post(&self, id: i64) -> Result<Post, ConsoleError> {
        self.resolve(id, LOAD_FAILED_NOTICE).await
    }

    /// Edit form for a post, from the loaded page or fetched by id.
    pub async fn open_editor(&self, id: i64) -> Result<PostEditForm, ConsoleError> {
        let post = self.resolve(id, LOAD_FAILED_NOTICE).await?;
        Ok(PostEditForm::from_post(&post))
    }

    /// Upload a batch of files into `form`, one file at a time.
    pub async fn upload_images(
        &self,
        form: &mut PostEditForm,
        files: Vec<ImageFile>,
    ) -> UploadBatchReport {
        upload_batch(form, self.uploader.as_ref(), self.prompt.as_ref(), files).await
    }

    /// Validate and persist a form; an empty description never reaches the store.
    pub async fn submit_form(&mut self, form: &PostEditForm) -> Result<(), ConsoleError> {
        let submission = match form.submit() {
            Ok(submission) => submission,
            Err(err) => {
                self.prompt.alert(EMPTY_DESCRIPTION_NOTICE);
                return Err(err.into());
            }
        };
        self.save(submission).await
    }

    pub async fn save(&mut self, submission: PostSubmission) -> Result<(), ConsoleError> {
        match submission.id {
            Some(id) => self.update(id, &submission).await,
            None => self.create(&submission).await,
        }
    }

    async fn create(&mut self, submission: &PostSubmission) -> Result<(), ConsoleError> {
        let draft = submission.draft();
        draft.validate()?;
        match self.repo.create(&draft).await {
            Ok(post) => {
                info!(id = ?post.id, "post created");
                self.posts.apply_created(post);
                self.cursor.increment_total();
                self.notify();
                Ok(())
            }
            Err(err) => Err(self.fail(CREATE_FAILED_NOTICE, err)),
        }
    }

    async fn update(&mut self, id: i64, submission: &PostSubmission) -> Result<(), ConsoleError> {
        let patch = submission.patch();
        patch.validate()?;
        match self.repo.update(id, &patch).await {
            Ok(()) => {
                info!(id, "post updated");
                self.posts.apply_update(id, &patch, OffsetDateTime::now_utc());
                self.notify();
                Ok(())
            }
            Err(err) => Err(self.fail(UPDATE_FAILED_NOTICE, err)),
        }
    }

    /// Delete after operator confirmation; a declined prompt makes no call.
    pub async fn delete(&mut self, id: i64) -> Result<DeleteOutcome, ConsoleError> {
        if !self.prompt.confirm(DELETE_CONFIRMATION) {
            return Ok(DeleteOutcome::Declined);
        }

        if let Err(err) = self.repo.delete(id).await {
            return Err(self.fail(DELETE_FAILED_NOTICE, err));
        }

        info!(id, "post deleted");
        self.posts.apply_deleted(id);
        let moved_back = self.cursor.decrement_total();
        self.notify();

        // The row is gone remotely; a failed reload has already alerted.
        if moved_back {
            if let Err(err) = self.load_page().await {
                warn!(id, error = %err, "reload after delete failed");
            }
        }
        Ok(DeleteOutcome::Deleted)
    }

    /// Flip between approved and pending; returns the new status.
    pub async fn toggle_status(&mut self, id: i64) -> Result<PostStatus, ConsoleError> {
        let current = self.resolve(id, STATUS_FAILED_NOTICE).await?.status;
        let target = toggle_target(current);

        if let Err(err) = self.repo.set_status(id, target).await {
            return Err(self.fail(STATUS_FAILED_NOTICE, err));
        }

        info!(id, from = %current, to = %target, "post status toggled");
        self.posts
            .apply_status(id, target, OffsetDateTime::now_utc());
        self.notify();
        Ok(target)
    }

    async fn resolve(&self, id: i64, notice: &str) -> Result<Post, ConsoleError> {
        if let Some(post) = self.posts.find(id) {
            return Ok(post.clone());
        }
        match self.repo.get(id).await {
            Ok(Some(post)) => Ok(post),
            Ok(None) => Err(ConsoleError::NotFound(id)),
            Err(err) => Err(self.fail(notice, err)),
        }
    }

    fn fail(&self, notice: &str, err: RepoError) -> ConsoleError {
        warn!(error = %err, notice, "repository call failed");
        metrics::counter!("postdeck_repository_failure_total").increment(1);
        self.prompt.alert(notice);
        err.into()
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}
