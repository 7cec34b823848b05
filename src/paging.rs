//! Page arithmetic shared by the request view and the console scroller.

use std::ops::Range;

/// Number of pages needed to show `len` items, `page_size` at a time
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// A page index kept inside `[0, total_pages - 1]`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    current: usize,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Highest valid page index for `len` items (0 when empty)
    pub fn last_index(&self, len: usize) -> usize {
        total_pages(len, self.page_size).saturating_sub(1)
    }

    /// Pull the index back into range after the item count changed
    pub fn clamp(&mut self, len: usize) {
        self.current = self.current.min(self.last_index(len));
    }

    /// Move forward one page. Returns false at the last page.
    pub fn next(&mut self, len: usize) -> bool {
        if self.current < self.last_index(len) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Move back one page. Returns false at the first page.
    pub fn previous(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Item range of the current page
    pub fn range(&self, len: usize) -> Range<usize> {
        let start = (self.current * self.page_size).min(len);
        let end = (start + self.page_size).min(len);
        start..end
    }

    pub fn in_range(&self, len: usize) -> bool {
        self.current <= self.last_index(len)
    }
}

/// Scroll position anchored to the end of a growing list.
///
/// `offset` counts lines hidden below the viewport; 0 means the view is
/// pinned to the tail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TailScroll {
    offset: usize,
}

impl TailScroll {
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn pinned(&self) -> bool {
        self.offset == 0
    }

    pub fn pin(&mut self) {
        self.offset = 0;
    }

    pub fn up(&mut self, lines: usize, len: usize) {
        self.offset = (self.offset + lines).min(len.saturating_sub(1));
    }

    pub fn down(&mut self, lines: usize) {
        self.offset = self.offset.saturating_sub(lines);
    }

    pub fn top(&mut self, len: usize) {
        self.offset = len.saturating_sub(1);
    }

    /// Range of items visible in a viewport of `height` rows
    pub fn window(&self, len: usize, height: usize) -> Range<usize> {
        let end = len.saturating_sub(self.offset).max(height.min(len));
        let start = end.saturating_sub(height);
        start..end
    }
}
