//! Faceted search and incremental listing-feed engine.
//!
//! Four cooperating pieces, all sans-io:
//!
//! - [`query::SearchQuery`] — the current filters/sort, round-trippable
//!   through the URL query string
//! - [`cache::ResultCache`] — offset-paginated accumulation for the active
//!   query, discarded on query change
//! - [`session::FeedSession`] — dispatch timing (debounced text, immediate
//!   filters), infinite-scroll guards and epoch-based staleness checks
//! - [`favorite::FavoriteToggle`] — optimistic favorite state with debounced
//!   persist and rollback
//!
//! [`controller::FeedController`] wires a session to a
//! [`quad_rpc::MarketBackend`] and is the only piece that does I/O.
//!
//! # Example
//!
//! ```rust,ignore
//! let query = SearchQuery::from_url_params("q=fan&sort=cheapest");
//! let (mut session, effects) = FeedSession::search(query);
//! let controller = FeedController::new(RpcClient::new(config));
//! controller.run(&mut session, effects).await;
//! // render session.items(); observe the sentinel; on visibility:
//! let effects = session.sentinel_visible();
//! controller.run(&mut session, effects).await;
//! ```

pub mod cache;
pub mod controller;
pub mod debounce;
pub mod favorite;
pub mod query;
pub mod session;

pub use cache::ResultCache;
pub use controller::FeedController;
pub use debounce::Debounce;
pub use favorite::{FavoriteStatus, FavoriteToggle, PersistOp, ToggleOutcome, PERSIST_DEBOUNCE};
pub use query::SearchQuery;
pub use session::{Effect, FeedScope, FeedSession, PageRequest, TEXT_DEBOUNCE};
