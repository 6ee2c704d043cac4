//! Repository traits describing the remote post collection.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::posts::{Post, PostDraft, PostPatch, PostStatus};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote store rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl RepoError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<DomainError> for RepoError {
    fn from(err: DomainError) -> Self {
        Self::InvalidInput {
            message: err.to_string(),
        }
    }
}

/// Paginated CRUD over the `posts` collection, ordered by ascending id.
///
/// Every call is a suspension point and independently fallible; callers
/// mirror a result locally only after it succeeds.
#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Total number of rows in the unfiltered feed.
    async fn count(&self) -> Result<u64, RepoError>;

    /// Rows of the 1-based `page`, `page_size` rows per page.
    async fn list(&self, page: u32, page_size: u32) -> Result<Vec<Post>, RepoError>;

    async fn get(&self, id: i64) -> Result<Option<Post>, RepoError>;

    /// Insert a post; the store assigns the id and timestamps.
    async fn create(&self, draft: &PostDraft) -> Result<Post, RepoError>;

    /// Partial update; `updated_at` is always refreshed.
    async fn update(&self, id: i64, patch: &PostPatch) -> Result<(), RepoError>;

    async fn delete(&self, id: i64) -> Result<(), RepoError>;

    async fn set_status(&self, id: i64, status: PostStatus) -> Result<(), RepoError> {
        self.update(id, &PostPatch::status(status)).await
    }
}

/// Zero-based row offset of a 1-based page.
pub fn page_offset(page: u32, page_size: u32) -> u64 {
    u64::from(page.max(1) - 1) * u64::from(page_size)
}
