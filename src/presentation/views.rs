//! Plain-text renderings of console state.

use time::format_description::well_known::Rfc3339;

use crate::application::bootstrap::BootstrapPhase;
use crate::application::pagination::PageCursor;
use crate::application::post_list::PostListState;
use crate::application::viewer::Gallery;
use crate::domain::posts::Post;

const DESCRIPTION_WIDTH: usize = 60;

pub fn page_header(cursor: &PageCursor) -> String {
    format!(
        "Page {} of {} ({} posts)",
        cursor.current_page(),
        cursor.max_page(),
        cursor.total_count()
    )
}

pub fn post_line(post: &Post) -> String {
    let id = post
        .id
        .map_or_else(|| "-".to_string(), |id| id.to_string());
    format!(
        "#{id:<6} [{status:<8}] {description} ({count} image{plural})",
        status = post.status,
        description = truncate(&post.description, DESCRIPTION_WIDTH),
        count = post.images.len(),
        plural = if post.images.len() == 1 { "" } else { "s" },
    )
}

pub fn page(posts: &PostListState, cursor: &PageCursor) -> String {
    let mut out = page_header(cursor);
    if posts.is_empty() {
        out.push_str("\n(no posts)");
    }
    for post in posts.posts() {
        out.push('\n');
        out.push_str(&post_line(post));
    }
    out
}

/// Full record, including every image URL.
pub fn post_detail(post: &Post) -> String {
    let mut out = post_line(post);
    if let Some(created) = post.created_at.and_then(|at| at.format(&Rfc3339).ok()) {
        out.push_str(&format!("\n  created {created}"));
    }
    if let Some(updated) = post.updated_at.and_then(|at| at.format(&Rfc3339).ok()) {
        out.push_str(&format!("\n  updated {updated}"));
    }
    for (index, url) in post.images.iter().enumerate() {
        out.push_str(&format!("\n  [{index}] {url}"));
    }
    out
}

pub fn gallery_frame(gallery: &Gallery) -> String {
    format!(
        "[{}/{}] {}",
        gallery.index() + 1,
        gallery.len(),
        gallery.current().unwrap_or_default()
    )
}

pub fn bootstrap_status(phase: &BootstrapPhase) -> Option<&'static str> {
    phase.error_message().or_else(|| phase.status_message())
}

fn truncate(text: &str, width: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= width && !text.contains('\n') {
        return line.to_string();
    }
    let mut short: String = line.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}
