//! Page-number pagination over the ordered feed.

use std::num::NonZeroU32;

/// Position within the feed. `current_page` never exceeds [`PageCursor::max_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    current_page: u32,
    page_size: NonZeroU32,
    total_count: u64,
}

impl PageCursor {
    pub fn new(page_size: NonZeroU32) -> Self {
        Self {
            current_page: 1,
            page_size,
            total_count: 0,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.get()
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// `max(1, ceil(total_count / page_size))`.
    pub fn max_page(&self) -> u32 {
        let pages = self.total_count.div_ceil(u64::from(self.page_size.get()));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.max_page()
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    /// Advance one page; returns whether the page changed.
    pub fn next(&mut self) -> bool {
        if self.has_next() {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    /// Step back one page; returns whether the page changed.
    pub fn prev(&mut self) -> bool {
        if self.has_prev() {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to `page`, clamped into `1..=max_page`.
    pub fn go_to(&mut self, page: u32) {
        self.current_page = page.clamp(1, self.max_page());
    }

    /// Record a new total and clamp the current page; returns whether it moved.
    pub fn set_total(&mut self, total_count: u64) -> bool {
        self.total_count = total_count;
        self.clamp()
    }

    pub fn increment_total(&mut self) {
        self.total_count = self.total_count.saturating_add(1);
    }

    /// Returns whether the current page had to move back.
    pub fn decrement_total(&mut self) -> bool {
        self.total_count = self.total_count.saturating_sub(1);
        self.clamp()
    }

    fn clamp(&mut self) -> bool {
        let max = self.max_page();
        if self.current_page > max {
            self.current_page = max;
            true
        } else {
            false
        }
    }
}
