//! Page state for remote option lists and local page reveal
//!
//! One `Paginator` tracks the cursor into a remote result set (or the
//! reveal window over a big local list), enforces the single-in-flight
//! rule, and decides when a scroll position should trigger the next load.

use crate::remote::RemotePage;
use tracing::debug;

/// Fraction of the list height that must be scrolled past before the next
/// local page is revealed.
const LOCAL_REVEAL_FRACTION: f64 = 0.8;

/// Scroll geometry reported by the host, in whatever unit it renders in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    /// Distance scrolled from the top of the list
    pub offset: f64,
    /// Height of the visible viewport
    pub viewport: f64,
    /// Total height of the scrollable content
    pub content: f64,
}

impl ScrollMetrics {
    #[must_use]
    pub fn distance_to_bottom(&self) -> f64 {
        (self.content - (self.offset + self.viewport)).max(0.0)
    }

    /// Fraction of the content height the viewport bottom has passed
    #[must_use]
    pub fn fraction_scrolled(&self) -> f64 {
        if self.content <= 0.0 {
            return 1.0;
        }
        ((self.offset + self.viewport) / self.content).clamp(0.0, 1.0)
    }
}

/// How an accepted page must be merged into the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMerge {
    /// First page of a query: drop non-selected entries, insert the page
    Replace,
    /// Follow-up page: append behind what is already shown
    Append,
}

/// Cursor/page state for one picker's option list
#[derive(Debug)]
pub struct Paginator {
    current_page: u32,
    has_more: bool,
    is_loading: bool,
    search_query: String,
    page_size: usize,
    scroll_threshold: f64,
}

impl Paginator {
    #[must_use]
    pub fn new(page_size: usize, scroll_threshold: f64) -> Self {
        Self {
            current_page: 1,
            has_more: true,
            is_loading: false,
            search_query: String::new(),
            page_size,
            scroll_threshold,
        }
    }

    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.current_page
    }

    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// A new query is being fetched: back to page 1, one load in flight
    pub fn begin_search(&mut self, query: &str) {
        self.search_query = query.to_string();
        self.current_page = 1;
        self.has_more = true;
        self.is_loading = true;
    }

    /// Try to start loading the next remote page
    ///
    /// Returns the page number to request, or `None` when a load is
    /// already in flight or the end of the result set was reached.
    /// Concurrent triggers (scroll plus an explicit "load more") collapse
    /// into the one in-flight call; the loser is dropped, not queued.
    pub fn try_begin_next(&mut self) -> Option<u32> {
        if self.is_loading {
            debug!("page load already in flight, dropping trigger");
            return None;
        }
        if !self.has_more {
            return None;
        }
        self.is_loading = true;
        Some(self.current_page + 1)
    }

    /// Accept a page that survived the staleness check
    pub fn apply_page(&mut self, page: &RemotePage) -> PageMerge {
        self.is_loading = false;
        self.has_more = page.has_more;
        // the server's echoed page number is authoritative
        self.current_page = page.current_page.max(1);
        if page.current_page <= 1 {
            PageMerge::Replace
        } else {
            PageMerge::Append
        }
    }

    /// The in-flight load failed; prior state stays untouched
    pub fn load_failed(&mut self) {
        self.is_loading = false;
    }

    /// Should this scroll position trigger a remote load?
    #[must_use]
    pub fn should_load_on_scroll(&self, metrics: ScrollMetrics) -> bool {
        metrics.distance_to_bottom() < self.scroll_threshold
    }

    // --- local (non-remote) page reveal ---

    /// Number of entries to reveal out of `total` matching local entries
    #[must_use]
    pub fn visible_window(&self, total: usize) -> usize {
        total.min(self.current_page as usize * self.page_size)
    }

    /// Should this scroll position reveal the next local page?
    #[must_use]
    pub fn should_reveal_on_scroll(&self, metrics: ScrollMetrics, total: usize) -> bool {
        self.visible_window(total) < total
            && metrics.fraction_scrolled() >= LOCAL_REVEAL_FRACTION
    }

    /// Reveal the next local page; returns `false` when everything is
    /// already visible
    pub fn reveal_next(&mut self, total: usize) -> bool {
        if self.visible_window(total) >= total {
            return false;
        }
        self.current_page += 1;
        true
    }

    /// Reset the reveal window (local query changed)
    pub fn reset_window(&mut self) {
        self.current_page = 1;
    }
}
