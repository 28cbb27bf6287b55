//! Accumulated results for the active query.
//!
//! Append-only while the query stands; discarded wholesale when it changes.
//! The offset advances by the fixed page stride regardless of how many rows a
//! batch actually held — the backend paginates by offset window, so callers
//! must not assume `offset == items.len()`.
//!
//! Rows are not deduplicated across windows: inserts landing between two page
//! fetches can shift the windows and surface a row twice (or skip one). That
//! is inherent to offset pagination and left visible.

use quad_core::listing::ListingSummary;
use quad_rpc::{ListingPage, PAGE_LIMIT};

/// The growing item list plus pagination state for one query.
#[derive(Debug, Clone)]
pub struct ResultCache {
    items: Vec<ListingSummary>,
    offset: u32,
    has_more: bool,
    loading: bool,
    first_page_loaded: bool,
    page_limit: u32,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::with_page_limit(PAGE_LIMIT)
    }

    pub fn with_page_limit(page_limit: u32) -> Self {
        Self {
            items: Vec::new(),
            offset: 0,
            has_more: true,
            loading: false,
            first_page_loaded: false,
            page_limit,
        }
    }

    /// A cache whose first page was rendered server-side. The loader is
    /// armed to continue from the next offset window.
    pub fn seeded(items: Vec<ListingSummary>) -> Self {
        let mut cache = Self::new();
        cache.offset = if items.is_empty() {
            0
        } else {
            cache.page_limit
        };
        cache.items = items;
        cache.first_page_loaded = true;
        cache
    }

    /// Discard everything for a fresh query and mark the first fetch as
    /// already underway.
    pub fn reset(&mut self) {
        self.items.clear();
        self.offset = 0;
        self.has_more = true;
        self.loading = true;
        self.first_page_loaded = false;
    }

    /// Apply a completed page fetch that was issued at `requested_offset`.
    ///
    /// Offset 0 replaces the list — a fresh search, not a continuation — so a
    /// late continuation response can never resurrect items from before a
    /// reset. Any other offset appends.
    pub fn append_page(&mut self, page: ListingPage, requested_offset: u32) {
        let batch_len = page.items.len() as u32;
        let sentinel = page.more;

        if requested_offset == 0 {
            self.items = page.items;
        } else {
            self.items.extend(page.items);
        }

        self.has_more = if batch_len == 0 {
            false
        } else {
            match sentinel {
                Some(flag) => flag,
                None => batch_len >= self.page_limit,
            }
        };
        self.offset = requested_offset + self.page_limit;
        self.loading = false;
        self.first_page_loaded = true;
    }

    /// A fetch failed: stop loading, keep items, leave `has_more` alone so a
    /// transient error never reads as "end of results".
    pub fn settle_error(&mut self) {
        self.loading = false;
    }

    pub fn mark_loading(&mut self) {
        self.loading = true;
    }

    /// All guards for issuing the next page fetch: more rows exist, nothing
    /// is in flight, and the first page has landed (the sentinel element can
    /// become visible before first paint).
    pub fn ready_for_next_page(&self) -> bool {
        self.has_more && !self.loading && self.first_page_loaded
    }

    pub fn items(&self) -> &[ListingSummary] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn first_page_loaded(&self) -> bool {
        self.first_page_loaded
    }

    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}
