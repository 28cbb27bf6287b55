//! Search route.
//!
//! Full requests render the whole page with the first result window already
//! fetched server-side. The client glue then drives the same backend through
//! fragment requests (`fragment=items&offset=N`) for debounced re-searches
//! and infinite scroll, so navigation stays shareable via the query string.

mod render;

use futures::SinkExt;
use spin_sdk::http::{Fields, IncomingRequest, Method, OutgoingResponse, ResponseOutparam};
use spin_sdk::http_component;

use quad_core::log::{LogLevel, Logger};
use quad_feed::query::decode_component;
use quad_feed::{FeedController, FeedSession, SearchQuery};
use quad_rpc::{BackendConfig, MarketBackend, RpcClient};

/// Search page handler.
#[http_component]
async fn handle_search(req: IncomingRequest, response_out: ResponseOutparam) {
    let log = Logger::new().with_component("search-page");

    if req.method() != Method::Get {
        respond(response_out, 405, "method not allowed".to_string()).await;
        return;
    }

    let path_with_query = req.path_with_query().unwrap_or_default();
    let query_string = path_with_query.split('?').nth(1).unwrap_or("").to_string();
    let query = SearchQuery::from_url_params(&query_string);

    let config = match BackendConfig::from_environment() {
        Ok(config) => config,
        Err(e) => {
            log.error(&format!("backend config unavailable: {e:#}"));
            respond(response_out, 500, render::render_config_error()).await;
            return;
        }
    };
    let controller = FeedController::new(RpcClient::new(config));

    // Fragment requests render one result window for the client glue to
    // splice in; full requests render the page around the first window.
    let html = if query_param(&query_string, "fragment").as_deref() == Some("items") {
        let offset = query_param(&query_string, "offset")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        fragment_response(&controller, &query, offset).await
    } else {
        page_response(&controller, query, &log).await
    };

    respond(response_out, 200, html).await;
}

/// One result window, plus the pagination marker the client glue reads.
async fn fragment_response(
    controller: &FeedController<RpcClient>,
    query: &SearchQuery,
    offset: u32,
) -> String {
    match controller
        .backend()
        .search_listings(&query.to_params(offset))
        .await
    {
        Ok(page) => {
            let has_more = match page.more {
                Some(flag) => !page.items.is_empty() && flag,
                None => page.items.len() as u32 >= quad_rpc::PAGE_LIMIT,
            };
            render::render_fragment(&page.items, has_more)
        }
        Err(e) => render::render_fragment_error(&e.to_string()),
    }
}

/// The full page with the first window fetched server-side.
async fn page_response(
    controller: &FeedController<RpcClient>,
    query: SearchQuery,
    log: &Logger,
) -> String {
    let (mut session, effects) = FeedSession::search(query);

    // Categories are non-critical reference data for the filter sheet;
    // fetch them alongside the first result window.
    let (_, categories) = futures::join!(
        controller.run(&mut session, effects),
        controller.backend().list_categories()
    );
    let categories = categories.unwrap_or_else(|e| {
        log.event(
            LogLevel::Warn,
            "category fetch failed",
            &[("error", serde_json::json!(e.to_string()))],
        );
        Vec::new()
    });

    render::render_page(&session, &categories)
}

/// Read one raw query parameter (the engine's codec ignores unknown keys).
fn query_param(query_string: &str, key: &str) -> Option<String> {
    query_string.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        (parts.next() == Some(key)).then(|| decode_component(parts.next().unwrap_or("")))
    })
}

async fn respond(response_out: ResponseOutparam, status: u16, html: String) {
    let header_list: Vec<(String, Vec<u8>)> = vec![(
        "content-type".to_owned(),
        "text/html; charset=utf-8".into(),
    )];
    let headers = Fields::from_list(&header_list).unwrap();
    let response = OutgoingResponse::new(headers);
    response.set_status_code(status).unwrap();
    let mut body = response.take_body();
    response_out.set(response);
    if let Err(e) = body.send(html.into_bytes()).await {
        eprintln!("failed to send response body: {e}");
    }
}
