//! Local mirror of the loaded feed page.
//!
//! The reducer is only ever fed results the remote store has confirmed, so it
//! has no failure paths of its own.

use time::OffsetDateTime;

use crate::domain::posts::{Post, PostPatch, PostStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostListState {
    posts: Vec<Post>,
}

impl PostListState {
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn find(&self, id: i64) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == Some(id))
    }

    pub fn replace_page(&mut self, posts: Vec<Post>) {
        self.posts = posts;
    }

    pub fn apply_created(&mut self, post: Post) {
        self.posts.push(post);
    }

    /// Returns whether a local entry matched `id`.
    pub fn apply_update(&mut self, id: i64, patch: &PostPatch, updated_at: OffsetDateTime) -> bool {
        match self.posts.iter_mut().find(|post| post.id == Some(id)) {
            Some(post) => {
                post.apply_patch(patch, updated_at);
                true
            }
            None => false,
        }
    }

    pub fn apply_status(&mut self, id: i64, status: PostStatus, updated_at: OffsetDateTime) -> bool {
        self.apply_update(id, &PostPatch::status(status), updated_at)
    }

    pub fn apply_deleted(&mut self, id: i64) -> bool {
        let before = self.posts.len();
        self.posts.retain(|post| post.id != Some(id));
        self.posts.len() != before
    }
}
