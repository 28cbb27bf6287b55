//! Feed session: dispatch timing, pagination and staleness rules.
//!
//! `FeedSession` is sans-io. Inputs are user events (keystrokes, filter
//! changes, sentinel visibility), timer ticks and fetch completions; outputs
//! are [`Effect`] values the embedder executes. There is no cancellation API
//! anywhere in the stack, so correctness under interleaving rests on one
//! rule: every fetch carries the epoch captured when it was issued, and a
//! completion whose epoch no longer matches is dropped without touching the
//! list.

use std::time::{Duration, Instant};

use quad_core::ids::{CategoryId, UserId};
use quad_core::listing::{Condition, ListingSummary, OfferType, SortBy};
use quad_rpc::ListingPage;

use crate::cache::ResultCache;
use crate::debounce::Debounce;
use crate::query::SearchQuery;

/// Quiet period after the last keystroke before a text search fires.
pub const TEXT_DEBOUNCE: Duration = Duration::from_millis(300);

/// What a feed session is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    /// Faceted search over the whole catalog.
    Search,
    /// Everything on campus.
    All,
    /// The viewer's hall of residence.
    Hall,
    /// The viewer's course.
    Course,
    /// One seller's listings.
    Seller(UserId),
}

impl FeedScope {
    /// Parse a feed route segment (`all|hall|course`).
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "all" => Some(FeedScope::All),
            "hall" => Some(FeedScope::Hall),
            "course" => Some(FeedScope::Course),
            _ => None,
        }
    }

    pub fn as_segment(&self) -> &'static str {
        match self {
            FeedScope::Search => "search",
            FeedScope::All => "all",
            FeedScope::Hall => "hall",
            FeedScope::Course => "course",
            FeedScope::Seller(_) => "seller",
        }
    }
}

/// A fetch issued by the session.
///
/// Everything needed to run the fetch — and to check its completion for
/// staleness — is captured at issue time.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub scope: FeedScope,
    pub query: SearchQuery,
    pub offset: u32,
    pub epoch: u64,
}

/// Side effects the embedder must carry out, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Replace the address-bar query string (shareable state). Always
    /// emitted before the fetch it belongs to.
    SyncUrl(String),
    /// Issue the described fetch and feed the outcome back via
    /// [`FeedSession::apply_page`] / [`FeedSession::apply_error`].
    Fetch(PageRequest),
}

/// One search-or-feed view: the active query, its accumulated results and
/// every dispatch rule.
#[derive(Debug, Clone)]
pub struct FeedSession {
    scope: FeedScope,
    query: SearchQuery,
    cache: ResultCache,
    debounce: Debounce<()>,
    epoch: u64,
    error: Option<String>,
}

impl FeedSession {
    /// Start a search session from a URL-parsed query.
    ///
    /// The first fetch is immediate — first paint never waits out a debounce
    /// window — and does not rewrite the URL it was parsed from.
    pub fn search(query: SearchQuery) -> (Self, Vec<Effect>) {
        let mut session = Self {
            scope: FeedScope::Search,
            query,
            cache: ResultCache::new(),
            debounce: Debounce::new(TEXT_DEBOUNCE),
            epoch: 0,
            error: None,
        };
        let effects = session.begin_search(false);
        (session, effects)
    }

    /// Start a feed session (`all`/`hall`/`course`/seller) with an immediate
    /// first fetch.
    pub fn feed(scope: FeedScope) -> (Self, Vec<Effect>) {
        let mut session = Self {
            scope,
            query: SearchQuery::default(),
            cache: ResultCache::new(),
            debounce: Debounce::new(TEXT_DEBOUNCE),
            epoch: 0,
            error: None,
        };
        let effects = session.begin_search(false);
        (session, effects)
    }

    /// Start a feed session whose first page was already rendered
    /// server-side. No fetch is issued; the loader continues from the next
    /// offset window.
    pub fn seeded(scope: FeedScope, items: Vec<ListingSummary>) -> Self {
        Self {
            scope,
            query: SearchQuery::default(),
            cache: ResultCache::seeded(items),
            debounce: Debounce::new(TEXT_DEBOUNCE),
            epoch: 1,
            error: None,
        }
    }

    /// Invalidate everything and fetch page one of the current query.
    fn begin_search(&mut self, sync_url: bool) -> Vec<Effect> {
        self.epoch += 1;
        self.cache.reset();
        self.error = None;
        self.debounce.cancel();
        let mut effects = Vec::with_capacity(2);
        if sync_url {
            effects.push(Effect::SyncUrl(self.query.to_url_params()));
        }
        effects.push(Effect::Fetch(self.request_at(0)));
        effects
    }

    fn request_at(&self, offset: u32) -> PageRequest {
        PageRequest {
            scope: self.scope.clone(),
            query: self.query.clone(),
            offset,
            epoch: self.epoch,
        }
    }

    /// Edit the free-text term. Coalesced: the fetch fires via [`tick`]
    /// once the quiet period passes, using whatever the query holds then.
    ///
    /// [`tick`]: FeedSession::tick
    pub fn set_text(&mut self, text: impl Into<String>, now: Instant) -> Vec<Effect> {
        let text = text.into();
        if text == self.query.text {
            return Vec::new();
        }
        self.query.text = text;
        self.debounce.arm((), now);
        Vec::new()
    }

    /// Change the sort order. Discrete: dispatches immediately.
    pub fn set_sort(&mut self, sort_by: SortBy) -> Vec<Effect> {
        if self.query.sort_by == sort_by {
            return Vec::new();
        }
        self.query.sort_by = sort_by;
        self.begin_search(true)
    }

    pub fn set_category(&mut self, category: Option<CategoryId>) -> Vec<Effect> {
        if self.query.category == category {
            return Vec::new();
        }
        self.query.category = category;
        self.begin_search(true)
    }

    pub fn set_offer_type(&mut self, offer_type: Option<OfferType>) -> Vec<Effect> {
        if self.query.offer_type == offer_type {
            return Vec::new();
        }
        self.query.offer_type = offer_type;
        self.begin_search(true)
    }

    pub fn set_condition(&mut self, condition: Option<Condition>) -> Vec<Effect> {
        if self.query.condition == condition {
            return Vec::new();
        }
        self.query.condition = condition;
        self.begin_search(true)
    }

    pub fn set_hall(&mut self, hall: Option<String>) -> Vec<Effect> {
        if self.query.hall == hall {
            return Vec::new();
        }
        self.query.hall = hall;
        self.begin_search(true)
    }

    pub fn set_price_range(&mut self, min: Option<u64>, max: Option<u64>) -> Vec<Effect> {
        if self.query.price_min == min && self.query.price_max == max {
            return Vec::new();
        }
        self.query.price_min = min;
        self.query.price_max = max;
        self.begin_search(true)
    }

    /// Drop the discrete filters (the filter sheet's "Clear" button).
    pub fn clear_filters(&mut self) -> Vec<Effect> {
        if self.query.active_filter_count() == 0 {
            return Vec::new();
        }
        self.query.clear_filters();
        self.begin_search(true)
    }

    /// Timer tick. Fires the pending text search once its window closes.
    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        if self.debounce.fire_due(now).is_some() {
            self.begin_search(true)
        } else {
            Vec::new()
        }
    }

    /// The sentinel element after the last rendered item became visible.
    ///
    /// Issues the next page fetch only when every guard holds: more rows
    /// exist, nothing is in flight, and the first page has landed. State is
    /// read here, at trigger time — never captured at subscription time.
    pub fn sentinel_visible(&mut self) -> Vec<Effect> {
        if !self.cache.ready_for_next_page() {
            return Vec::new();
        }
        self.cache.mark_loading();
        vec![Effect::Fetch(self.request_at(self.cache.offset()))]
    }

    /// Apply a completed fetch. Returns `false` when the completion was
    /// stale (issued under an earlier epoch) and was dropped untouched.
    pub fn apply_page(&mut self, request: &PageRequest, page: ListingPage) -> bool {
        if request.epoch != self.epoch {
            return false;
        }
        self.error = None;
        self.cache.append_page(page, request.offset);
        true
    }

    /// Apply a failed fetch: stop loading, keep items, leave `has_more`
    /// alone. Returns `false` for stale completions.
    pub fn apply_error(&mut self, request: &PageRequest, message: impl Into<String>) -> bool {
        if request.epoch != self.epoch {
            return false;
        }
        self.cache.settle_error();
        self.error = Some(message.into());
        true
    }

    pub fn scope(&self) -> &FeedScope {
        &self.scope
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn items(&self) -> &[ListingSummary] {
        self.cache.items()
    }

    pub fn has_more(&self) -> bool {
        self.cache.has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.cache.is_loading()
    }

    /// The recoverable error from the last failed fetch, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// A completed query with zero matches — distinct from a failed fetch.
    pub fn is_empty_result(&self) -> bool {
        self.cache.first_page_loaded() && self.cache.is_empty() && self.error.is_none()
    }

    /// Offset the next page fetch would use.
    pub fn next_offset(&self) -> u32 {
        self.cache.offset()
    }

    /// The feed ran out: show the terminal end marker.
    pub fn end_reached(&self) -> bool {
        !self.cache.has_more() && !self.cache.is_empty()
    }

    /// Next wake-up the embedder should schedule for [`tick`], if any.
    ///
    /// [`tick`]: FeedSession::tick
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quad_core::listing::ListingSummary;

    fn listing(id: &str) -> ListingSummary {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Listing {id}"),
            "price": 500,
            "seller": {"id": "usr-1", "name": "Ada"},
            "created_at": "2025-11-02T09:30:00Z"
        }))
        .unwrap()
    }

    fn page(n: usize, start: usize, more: Option<bool>) -> ListingPage {
        ListingPage {
            items: (start..start + n)
                .map(|i| listing(&format!("lst-{i}")))
                .collect(),
            more,
            total: None,
        }
    }

    fn fetch_of(effects: &[Effect]) -> PageRequest {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::Fetch(req) => Some(req.clone()),
                _ => None,
            })
            .expect("expected a fetch effect")
    }

    #[test]
    fn test_first_mount_fetches_immediately_without_url_sync() {
        let (_, effects) = FeedSession::search(SearchQuery::from_url_params("q=fan"));
        assert_eq!(effects.len(), 1);
        let req = fetch_of(&effects);
        assert_eq!(req.offset, 0);
        assert_eq!(req.query.text, "fan");
        assert!(!effects.iter().any(|e| matches!(e, Effect::SyncUrl(_))));
    }

    #[test]
    fn test_text_edits_coalesce_to_one_fetch_with_last_value() {
        let (mut session, effects) = FeedSession::search(SearchQuery::default());
        let first = fetch_of(&effects);
        session.apply_page(&first, page(20, 0, Some(true)));

        let t0 = Instant::now();
        assert!(session.set_text("p", t0).is_empty());
        assert!(session
            .set_text("ph", t0 + Duration::from_millis(100))
            .is_empty());
        assert!(session
            .set_text("pho", t0 + Duration::from_millis(200))
            .is_empty());
        // Quiet period measured from the last keystroke.
        assert!(session.tick(t0 + Duration::from_millis(450)).is_empty());
        let effects = session.tick(t0 + Duration::from_millis(500));
        let req = fetch_of(&effects);
        assert_eq!(req.query.text, "pho");
        assert_eq!(req.offset, 0);
        // Nothing further fires.
        assert!(session.tick(t0 + Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn test_text_dispatch_syncs_url_first() {
        let (mut session, effects) = FeedSession::search(SearchQuery::default());
        session.apply_page(&fetch_of(&effects), page(20, 0, Some(true)));

        let t0 = Instant::now();
        session.set_text("lamp", t0);
        let effects = session.tick(t0 + TEXT_DEBOUNCE);
        assert_eq!(effects.len(), 2);
        assert!(matches!(&effects[0], Effect::SyncUrl(url) if url == "q=lamp"));
        assert!(matches!(&effects[1], Effect::Fetch(_)));
    }

    #[test]
    fn test_discrete_filter_dispatches_immediately() {
        let (mut session, effects) = FeedSession::search(SearchQuery::default());
        session.apply_page(&fetch_of(&effects), page(20, 0, Some(true)));

        let effects = session.set_sort(SortBy::Cheapest);
        assert!(matches!(&effects[0], Effect::SyncUrl(url) if url == "sort=cheapest"));
        let req = fetch_of(&effects);
        assert_eq!(req.offset, 0);
        assert_eq!(req.query.sort_by, SortBy::Cheapest);
    }

    #[test]
    fn test_unchanged_filter_is_a_no_op() {
        let (mut session, effects) = FeedSession::search(SearchQuery::default());
        session.apply_page(&fetch_of(&effects), page(20, 0, Some(true)));
        assert!(session.set_sort(SortBy::Newest).is_empty());
        assert!(session.set_hall(None).is_empty());
        assert!(session.clear_filters().is_empty());
    }

    #[test]
    fn test_filter_change_resets_offset_and_replaces_items() {
        let (mut session, effects) = FeedSession::search(SearchQuery::default());
        session.apply_page(&fetch_of(&effects), page(20, 0, Some(true)));
        let next = fetch_of(&session.sentinel_visible());
        assert_eq!(next.offset, 20);
        session.apply_page(&next, page(20, 20, Some(true)));
        assert_eq!(session.items().len(), 40);

        let effects = session.set_condition(Some(Condition::New));
        let req = fetch_of(&effects);
        assert_eq!(req.offset, 0);
        session.apply_page(&req, page(7, 100, Some(false)));
        // Replaced, not appended.
        assert_eq!(session.items().len(), 7);
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let (mut session, effects) = FeedSession::search(SearchQuery::default());
        session.apply_page(&fetch_of(&effects), page(20, 0, Some(true)));
        // Page-2 fetch for query A goes out...
        let stale = fetch_of(&session.sentinel_visible());
        // ...then the query changes to B before the response lands.
        let fresh = fetch_of(&session.set_hall(Some("tedder".to_string())));
        session.apply_page(&fresh, page(4, 200, Some(false)));
        assert_eq!(session.items().len(), 4);

        // A's page-2 response arrives late: dropped, list untouched.
        assert!(!session.apply_page(&stale, page(20, 20, Some(true))));
        assert_eq!(session.items().len(), 4);
        assert!(!session.apply_error(&stale, "timeout"));
        assert!(session.error().is_none());
    }

    #[test]
    fn test_sentinel_guards() {
        let (mut session, effects) = FeedSession::search(SearchQuery::default());
        // First fetch still in flight: observer firing early does nothing.
        assert!(session.sentinel_visible().is_empty());
        session.apply_page(&fetch_of(&effects), page(20, 0, Some(true)));

        let req = fetch_of(&session.sentinel_visible());
        // In flight now: a second visibility event issues nothing.
        assert!(session.sentinel_visible().is_empty());
        session.apply_page(&req, page(20, 20, Some(false)));

        // Feed exhausted: no more fetches, terminal marker shows.
        assert!(session.sentinel_visible().is_empty());
        assert!(session.end_reached());
    }

    #[test]
    fn test_fetch_failure_is_recoverable() {
        let (mut session, effects) = FeedSession::search(SearchQuery::default());
        session.apply_page(&fetch_of(&effects), page(20, 0, Some(true)));

        let req = fetch_of(&session.sentinel_visible());
        session.apply_error(&req, "HTTP 503 from backend");
        assert_eq!(session.items().len(), 20);
        assert!(session.has_more());
        assert!(!session.is_loading());
        assert_eq!(session.error(), Some("HTTP 503 from backend"));

        // Scrolling again retries.
        let retry = fetch_of(&session.sentinel_visible());
        assert_eq!(retry.offset, 20);
        session.apply_page(&retry, page(5, 20, Some(false)));
        assert!(session.error().is_none());
        assert_eq!(session.items().len(), 25);
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let (mut session, effects) = FeedSession::search(SearchQuery::from_url_params("q=xyzzy"));
        session.apply_page(&fetch_of(&effects), page(0, 0, None));
        assert!(session.is_empty_result());
        assert!(session.error().is_none());
        assert!(!session.end_reached());
    }

    #[test]
    fn test_pending_text_folds_into_discrete_dispatch() {
        let (mut session, effects) = FeedSession::search(SearchQuery::default());
        session.apply_page(&fetch_of(&effects), page(20, 0, Some(true)));

        let t0 = Instant::now();
        session.set_text("iron", t0);
        // The filter click dispatches immediately, carrying the typed text.
        let effects = session.set_sort(SortBy::Popular);
        let req = fetch_of(&effects);
        assert_eq!(req.query.text, "iron");
        assert_eq!(req.query.sort_by, SortBy::Popular);
        // The pending debounce was swallowed; no double fetch later.
        assert!(session.tick(t0 + TEXT_DEBOUNCE).is_empty());
    }

    #[test]
    fn test_seeded_feed_continues_from_next_window() {
        let items: Vec<_> = (0..20).map(|i| listing(&format!("lst-{i}"))).collect();
        let mut session = FeedSession::seeded(FeedScope::Hall, items);
        let req = fetch_of(&session.sentinel_visible());
        assert_eq!(req.offset, 20);
        assert_eq!(req.scope, FeedScope::Hall);
        session.apply_page(&req, page(5, 20, Some(false)));
        assert_eq!(session.items().len(), 25);
        assert!(session.end_reached());
    }

    #[test]
    fn test_scroll_scenario_end_to_end() {
        // 20 rows with has_more=true, then 5 rows with has_more=false.
        let (mut session, effects) = FeedSession::search(SearchQuery::default());
        let first = fetch_of(&effects);
        session.apply_page(&first, page(20, 0, Some(true)));
        assert_eq!(session.items().len(), 20);
        assert!(session.has_more());

        let second = fetch_of(&session.sentinel_visible());
        assert_eq!(second.offset, 20);
        session.apply_page(&second, page(5, 20, Some(false)));
        assert_eq!(session.items().len(), 25);
        assert!(session.end_reached());
        assert!(session.sentinel_visible().is_empty());
        assert!(session.sentinel_visible().is_empty());
    }
}
