//! Feed posts under moderation.

use postdeck_api_types::PostRow;
use time::OffsetDateTime;

use super::error::DomainError;

pub use postdeck_api_types::PostStatus;

/// A post as mirrored locally. `id` is `None` until the store assigns one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: Option<i64>,
    pub description: String,
    pub status: PostStatus,
    pub images: Vec<String>,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: Some(row.id),
            description: row.description.unwrap_or_default(),
            status: row.status,
            images: row.images.unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl Post {
    /// Merge a confirmed patch into this post.
    pub fn apply_patch(&mut self, patch: &PostPatch, updated_at: OffsetDateTime) {
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(images) = &patch.images {
            self.images.clone_from(images);
        }
        self.updated_at = Some(updated_at);
    }
}

/// Status reached by the quick toggle action.
///
/// Only approved and pending alternate; a rejected post toggles to pending and
/// can only be rejected again through the edit form.
pub fn toggle_target(status: PostStatus) -> PostStatus {
    match status {
        PostStatus::Approved | PostStatus::Rejected => PostStatus::Pending,
        PostStatus::Pending => PostStatus::Approved,
    }
}

/// Fields supplied when creating a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub description: String,
    pub status: PostStatus,
    pub images: Vec<String>,
}

impl PostDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        ensure_description(&self.description)
    }
}

/// Partial update of a persisted post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    pub description: Option<String>,
    pub status: Option<PostStatus>,
    pub images: Option<Vec<String>>,
}

impl PostPatch {
    pub fn status(status: PostStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        match &self.description {
            Some(description) => ensure_description(description),
            None => Ok(()),
        }
    }
}

pub fn ensure_description(description: &str) -> Result<(), DomainError> {
    if description.trim().is_empty() {
        return Err(DomainError::validation("post description must not be empty"));
    }
    Ok(())
}
