//! Async driver: executes session effects against a backend.
//!
//! `FeedSession` decides *what* to do; this controller does it. Fetch
//! completions are fed straight back into the session, which is where stale
//! responses get dropped.

use std::time::Instant;

use quad_core::log::{LogLevel, Logger};
use quad_core::viewer::Viewer;
use quad_rpc::{ListingPage, MarketBackend, PageParams, RpcError, UserListingsParams};

use crate::favorite::{FavoriteToggle, PersistOp};
use crate::session::{Effect, FeedScope, FeedSession, PageRequest};

/// Drives a [`FeedSession`] (and favorite toggles) against a backend.
pub struct FeedController<B> {
    backend: B,
    log: Logger,
}

impl<B: MarketBackend> FeedController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            log: Logger::new().with_component("feed"),
        }
    }

    pub fn with_logger(mut self, log: Logger) -> Self {
        self.log = log;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Execute a batch of effects in order. Returns the URL strings the
    /// embedder should reflect into the address bar.
    pub async fn run(&self, session: &mut FeedSession, effects: Vec<Effect>) -> Vec<String> {
        let mut urls = Vec::new();
        for effect in effects {
            match effect {
                Effect::SyncUrl(url) => urls.push(url),
                Effect::Fetch(request) => self.run_fetch(session, request).await,
            }
        }
        urls
    }

    async fn run_fetch(&self, session: &mut FeedSession, request: PageRequest) {
        match self.fetch(&request).await {
            Ok(page) => {
                if !session.apply_page(&request, page) {
                    self.log.event(
                        LogLevel::Debug,
                        "stale page dropped",
                        &[
                            ("epoch", serde_json::json!(request.epoch)),
                            ("offset", serde_json::json!(request.offset)),
                        ],
                    );
                }
            }
            Err(e) => {
                let applied = session.apply_error(&request, e.to_string());
                self.log.event(
                    LogLevel::Warn,
                    "page fetch failed",
                    &[
                        ("offset", serde_json::json!(request.offset)),
                        ("stale", serde_json::json!(!applied)),
                        ("error", serde_json::json!(e.to_string())),
                    ],
                );
            }
        }
    }

    async fn fetch(&self, request: &PageRequest) -> Result<ListingPage, RpcError> {
        match &request.scope {
            FeedScope::Search => {
                self.backend
                    .search_listings(&request.query.to_params(request.offset))
                    .await
            }
            FeedScope::All => self.backend.list_all(PageParams::at(request.offset)).await,
            FeedScope::Hall => self.backend.list_hall(PageParams::at(request.offset)).await,
            FeedScope::Course => {
                self.backend
                    .list_course(PageParams::at(request.offset))
                    .await
            }
            FeedScope::Seller(user_id) => {
                self.backend
                    .list_user_listings(&UserListingsParams::new(user_id.clone()).at(request.offset))
                    .await
            }
        }
    }

    /// Load the initial membership state for a favorite control. Anonymous
    /// viewers get a disabled control; nothing is fetched for them.
    pub async fn load_favorite_status(&self, viewer: &Viewer, favorite: &mut FavoriteToggle) {
        let Some(user_id) = viewer.user_id() else {
            return;
        };
        match self
            .backend
            .favorite_status(user_id, favorite.listing())
            .await
        {
            Ok(favorited) => favorite.resolve_status(favorited),
            // A failed probe leaves the control unresolved; clicking it
            // stays inert rather than guessing.
            Err(e) => self.log.event(
                LogLevel::Warn,
                "favorite status probe failed",
                &[("error", serde_json::json!(e.to_string()))],
            ),
        }
    }

    /// Run the persist op due on a favorite toggle, if any. Returns whether
    /// a network call was made.
    pub async fn pump_favorite(
        &self,
        viewer: &Viewer,
        favorite: &mut FavoriteToggle,
        now: Instant,
    ) -> bool {
        let Some(op) = favorite.tick(now) else {
            return false;
        };
        let Some(user_id) = viewer.user_id() else {
            // toggle() refuses anonymous viewers, so a due op without a
            // user means the session expired mid-window; revert.
            favorite.on_persist(Err(RpcError::Unauthenticated));
            return false;
        };
        let result = match op {
            PersistOp::Insert => self.backend.set_favorite(user_id, favorite.listing()).await,
            PersistOp::Remove => {
                self.backend
                    .unset_favorite(user_id, favorite.listing())
                    .await
            }
        };
        favorite.on_persist(result);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    use async_trait::async_trait;
    use quad_core::category::Category;
    use quad_core::ids::{ListingId, UserId};
    use quad_core::listing::ListingSummary;
    use quad_core::viewer::UserProfile;
    use quad_rpc::SearchParams;

    use crate::favorite::PERSIST_DEBOUNCE;
    use crate::query::SearchQuery;

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

    /// Scripted backend: pops pre-loaded responses and records calls.
    #[derive(Default)]
    struct ScriptedBackend {
        pages: RefCell<VecDeque<Result<ListingPage, RpcError>>>,
        search_offsets: RefCell<Vec<u32>>,
        favorite_calls: RefCell<Vec<&'static str>>,
        favorite_result: RefCell<Option<Result<(), RpcError>>>,
    }

    impl ScriptedBackend {
        fn with_pages(
            pages: impl IntoIterator<Item = Result<ListingPage, RpcError>>,
        ) -> Self {
            Self {
                pages: RefCell::new(pages.into_iter().collect()),
                ..Default::default()
            }
        }

        fn next_page(&self) -> Result<ListingPage, RpcError> {
            self.pages
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| panic!("backend called more times than scripted"))
        }
    }

    #[async_trait(?Send)]
    impl MarketBackend for ScriptedBackend {
        async fn search_listings(&self, params: &SearchParams) -> Result<ListingPage, RpcError> {
            self.search_offsets.borrow_mut().push(params.page_offset);
            self.next_page()
        }

        async fn list_all(&self, _page: PageParams) -> Result<ListingPage, RpcError> {
            self.next_page()
        }

        async fn list_hall(&self, _page: PageParams) -> Result<ListingPage, RpcError> {
            self.next_page()
        }

        async fn list_course(&self, _page: PageParams) -> Result<ListingPage, RpcError> {
            self.next_page()
        }

        async fn list_user_listings(
            &self,
            _params: &UserListingsParams,
        ) -> Result<ListingPage, RpcError> {
            self.next_page()
        }

        async fn list_categories(&self) -> Result<Vec<Category>, RpcError> {
            Ok(Vec::new())
        }

        async fn get_listing(
            &self,
            _id: &ListingId,
        ) -> Result<Option<ListingSummary>, RpcError> {
            Ok(None)
        }

        async fn favorite_status(
            &self,
            _user: &UserId,
            _listing: &ListingId,
        ) -> Result<bool, RpcError> {
            Ok(false)
        }

        async fn set_favorite(
            &self,
            _user: &UserId,
            _listing: &ListingId,
        ) -> Result<(), RpcError> {
            self.favorite_calls.borrow_mut().push("set");
            self.favorite_result.borrow_mut().take().unwrap_or(Ok(()))
        }

        async fn unset_favorite(
            &self,
            _user: &UserId,
            _listing: &ListingId,
        ) -> Result<(), RpcError> {
            self.favorite_calls.borrow_mut().push("unset");
            self.favorite_result.borrow_mut().take().unwrap_or(Ok(()))
        }
    }

    fn signed_in() -> Viewer {
        Viewer::signed_in(UserProfile {
            id: UserId::new("usr-1"),
            name: "Ada".to_string(),
            hall_of_residence: None,
            course: None,
            avatar: None,
        })
    }

    #[tokio::test]
    async fn test_initial_fetch_then_scroll_to_end() {
        let backend = ScriptedBackend::with_pages([
            Ok(page(20, 0, Some(true))),
            Ok(page(5, 20, Some(false))),
        ]);
        let controller = FeedController::new(backend);

        let (mut session, effects) = FeedSession::search(SearchQuery::default());
        controller.run(&mut session, effects).await;
        assert_eq!(session.items().len(), 20);
        assert!(session.has_more());

        let effects = session.sentinel_visible();
        controller.run(&mut session, effects).await;
        assert_eq!(session.items().len(), 25);
        assert!(session.end_reached());

        // Further scroll events issue no fetch: the scripted backend would
        // panic if called again.
        let effects = session.sentinel_visible();
        controller.run(&mut session, effects).await;
        assert_eq!(
            controller.backend().search_offsets.borrow().as_slice(),
            &[0, 20]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_items_and_has_more() {
        let backend = ScriptedBackend::with_pages([
            Ok(page(20, 0, Some(true))),
            Err(RpcError::Http {
                status: 503,
                url: "u".to_string(),
            }),
        ]);
        let controller = FeedController::new(backend);

        let (mut session, effects) = FeedSession::search(SearchQuery::default());
        controller.run(&mut session, effects).await;
        let effects = session.sentinel_visible();
        controller.run(&mut session, effects).await;

        assert_eq!(session.items().len(), 20);
        assert!(session.has_more());
        assert!(session.error().is_some());
    }

    #[tokio::test]
    async fn test_sort_change_returns_url_and_replaces_items() {
        let backend = ScriptedBackend::with_pages([
            Ok(page(20, 0, Some(true))),
            Ok(page(3, 0, Some(false))),
        ]);
        let controller = FeedController::new(backend);

        let (mut session, effects) = FeedSession::search(SearchQuery::default());
        controller.run(&mut session, effects).await;

        let effects = session.set_sort(quad_core::listing::SortBy::Cheapest);
        let urls = controller.run(&mut session, effects).await;
        assert_eq!(urls, vec!["sort=cheapest".to_string()]);
        assert_eq!(session.items().len(), 3);
        assert_eq!(
            controller.backend().search_offsets.borrow().as_slice(),
            &[0, 0]
        );
    }

    #[tokio::test]
    async fn test_double_toggle_makes_one_unset_call() {
        let backend = ScriptedBackend::default();
        let controller = FeedController::new(backend);
        let viewer = signed_in();

        let mut favorite = FavoriteToggle::new(ListingId::new("lst-1"));
        favorite.resolve_status(false);

        let t0 = Instant::now();
        let _ = favorite.toggle(&viewer, t0);
        let _ = favorite.toggle(&viewer, t0 + Duration::from_millis(120));

        // First deadline: window was re-armed, nothing persists.
        assert!(
            !controller
                .pump_favorite(&viewer, &mut favorite, t0 + PERSIST_DEBOUNCE)
                .await
        );
        assert!(
            controller
                .pump_favorite(
                    &viewer,
                    &mut favorite,
                    t0 + Duration::from_millis(120) + PERSIST_DEBOUNCE
                )
                .await
        );
        assert_eq!(
            controller.backend().favorite_calls.borrow().as_slice(),
            &["unset"]
        );
    }

    #[tokio::test]
    async fn test_conflict_persist_is_success() {
        let backend = ScriptedBackend::default();
        *backend.favorite_result.borrow_mut() = Some(Err(RpcError::Conflict));
        let controller = FeedController::new(backend);
        let viewer = signed_in();

        let mut favorite = FavoriteToggle::new(ListingId::new("lst-1"));
        favorite.resolve_status(false);
        let t0 = Instant::now();
        let _ = favorite.toggle(&viewer, t0);
        let _ = controller
            .pump_favorite(&viewer, &mut favorite, t0 + PERSIST_DEBOUNCE)
            .await;

        assert!(favorite.is_favorited());
        assert!(favorite.error().is_none());
    }
}
