//! Wire shapes exchanged with the hosted data store and the image host.
//!
//! Rows mirror the `posts` collection as the PostgREST endpoint returns it;
//! the domain layer converts them into its own `Post` type.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Moderation state persisted in the `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Pending => "pending",
            PostStatus::Approved => "approved",
            PostStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A row of the `posts` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRow {
    pub id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: PostStatus,
    /// Stored as a JSON array; older rows may carry `null`.
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// Insert payload; the server assigns `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostInsertRow {
    pub description: String,
    pub status: PostStatus,
    pub images: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Partial update payload; absent fields are left untouched by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostPatchRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Response body of the image host upload endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageHostResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<ImageHostData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageHostData {
    #[serde(default)]
    pub url: Option<String>,
}

impl ImageHostResponse {
    /// Public URL of the uploaded image, if the response has the success shape.
    pub fn into_url(self) -> Option<String> {
        if self.success == Some(false) {
            return None;
        }
        self.data
            .and_then(|data| data.url)
            .filter(|url| !url.is_empty())
    }
}
