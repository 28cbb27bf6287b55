//! Feed routes: `/feed/{all|hall|course}`.
//!
//! Same incremental-loading contract as the search page, without the filter
//! surface: the route segment picks the feed procedure, the first window
//! renders server-side, and fragment requests extend the list as the
//! sentinel comes into view.

use futures::SinkExt;
use spin_sdk::http::{Fields, IncomingRequest, Method, OutgoingResponse, ResponseOutparam};
use spin_sdk::http_component;

use quad_core::listing::ListingSummary;
use quad_core::log::Logger;
use quad_feed::query::decode_component;
use quad_feed::{FeedController, FeedScope, FeedSession};
use quad_rpc::{BackendConfig, MarketBackend, PageParams, RpcClient, RpcError, PAGE_LIMIT};

/// Feed page handler.
#[http_component]
async fn handle_feed(req: IncomingRequest, response_out: ResponseOutparam) {
    let log = Logger::new().with_component("feed-page");

    if req.method() != Method::Get {
        respond(response_out, 405, "method not allowed".to_string()).await;
        return;
    }

    let path_with_query = req.path_with_query().unwrap_or_default();
    let (path, query_string) = split_path_query(&path_with_query);

    let Some(scope) = feed_scope(path) else {
        respond(response_out, 404, render_not_found()).await;
        return;
    };

    let config = match BackendConfig::from_environment() {
        Ok(config) => config,
        Err(e) => {
            log.error(&format!("backend config unavailable: {e:#}"));
            respond(response_out, 500, "<h1>Service unavailable</h1>".to_string()).await;
            return;
        }
    };
    let controller = FeedController::new(RpcClient::new(config));

    let html = if query_param(query_string, "fragment").as_deref() == Some("items") {
        let offset = query_param(query_string, "offset")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        match fetch_window(controller.backend(), &scope, offset).await {
            Ok((items, has_more)) => render_fragment(&items, has_more),
            Err(e) => render_fragment_error(&e.to_string()),
        }
    } else {
        let (mut session, effects) = FeedSession::feed(scope.clone());
        controller.run(&mut session, effects).await;
        render_page(&scope, &session)
    };

    respond(response_out, 200, html).await;
}

/// The feed scope for a `/feed/{segment}` path.
fn feed_scope(path: &str) -> Option<FeedScope> {
    let segment = path.trim_end_matches('/').rsplit('/').next()?;
    FeedScope::from_segment(segment)
}

async fn fetch_window(
    backend: &RpcClient,
    scope: &FeedScope,
    offset: u32,
) -> Result<(Vec<ListingSummary>, bool), RpcError> {
    let page = match scope {
        FeedScope::All => backend.list_all(PageParams::at(offset)).await?,
        FeedScope::Hall => backend.list_hall(PageParams::at(offset)).await?,
        FeedScope::Course => backend.list_course(PageParams::at(offset)).await?,
        _ => return Ok((Vec::new(), false)),
    };
    let has_more = match page.more {
        Some(flag) => !page.items.is_empty() && flag,
        None => page.items.len() as u32 >= PAGE_LIMIT,
    };
    Ok((page.items, has_more))
}

fn feed_title(scope: &FeedScope) -> (&'static str, &'static str) {
    match scope {
        FeedScope::Hall => ("From your hall", "Listings from students in your hall"),
        FeedScope::Course => ("For your course", "Items relevant to your course"),
        _ => ("What students are selling", "Browse everything available on campus"),
    }
}

fn render_page(scope: &FeedScope, session: &FeedSession) -> String {
    let (title, subtitle) = feed_title(scope);
    let initial = serde_json::json!({
        "offset": session.next_offset(),
        "hasMore": session.has_more(),
    });
    let body = if session.error().is_some() {
        r#"<div class="empty"><h3>Something went wrong</h3><p>Scroll to retry.</p></div>"#
            .to_string()
    } else if session.is_empty_result() {
        r#"<div class="empty"><div class="glyph">&#128236;</div><h3>No items found</h3></div>"#
            .to_string()
    } else {
        format!(
            r#"<div class="grid" id="grid">{}</div>"#,
            session.items().iter().map(render_card).collect::<String>()
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} - Quadmart</title>
<style>{css}</style>
</head>
<body>
<header class="banner">
    <a href="/" class="back" aria-label="Go back">&larr;</a>
    <h1>{title}</h1>
    <p>{subtitle}</p>
</header>
<main>
    {body}
    <div id="spinner" class="spinner" hidden>Loading&hellip;</div>
    <div id="end-marker" class="end" {end_hidden}>You've reached the end!</div>
    <div id="sentinel" class="sentinel"></div>
</main>
<script>const INITIAL = {initial};</script>
<script>{js}</script>
</body>
</html>"#,
        title = title,
        subtitle = subtitle,
        css = FEED_STYLES,
        body = body,
        end_hidden = if session.end_reached() { "" } else { "hidden" },
        initial = initial,
        js = FEED_SCRIPT,
    )
}

fn render_card(listing: &ListingSummary) -> String {
    let cover = listing
        .cover_image()
        .map(|url| format!(r#"<img src="{}" alt="" loading="lazy">"#, escape_html(url)))
        .unwrap_or_else(|| r#"<div class="no-image">No photo</div>"#.to_string());

    format!(
        r#"<a class="card" href="/listing/{id}">
    <div class="card-image">{cover}</div>
    <div class="card-body">
        <h3>{title}</h3>
        <p class="price">{price}</p>
    </div>
</a>"#,
        id = escape_html(listing.id.as_str()),
        cover = cover,
        title = escape_html(&listing.title),
        price = format_price(listing.price),
    )
}

fn render_fragment(items: &[ListingSummary], has_more: bool) -> String {
    format!(
        r#"{}<template id="page-state" data-has-more="{}"></template>"#,
        items.iter().map(render_card).collect::<String>(),
        has_more,
    )
}

fn render_fragment_error(message: &str) -> String {
    format!(
        r#"<template id="page-error" data-message="{}"></template>"#,
        escape_html(message)
    )
}

fn render_not_found() -> String {
    r#"<!DOCTYPE html><html><body><h1>Not found</h1>
<p>Feeds live at /feed/all, /feed/hall and /feed/course.</p></body></html>"#
        .to_string()
}

fn split_path_query(path_with_query: &str) -> (&str, &str) {
    match path_with_query.split_once('?') {
        Some((path, query)) => (path, query),
        None => (path_with_query, ""),
    }
}

fn query_param(query_string: &str, key: &str) -> Option<String> {
    query_string.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        (parts.next() == Some(key)).then(|| decode_component(parts.next().unwrap_or("")))
    })
}

fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    out.push('₦');
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
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

const FEED_STYLES: &str = r#"
* { box-sizing: border-box; margin: 0; }
body { font-family: system-ui, sans-serif; background: #fafaf9; color: #1c1917; }
.banner { background: linear-gradient(135deg, #f97316, #c2410c); color: #fff; padding: 1.25rem; }
.banner p { color: #ffedd5; font-size: .875rem; }
.banner .back { color: #fff; text-decoration: none; font-size: 1.25rem; }
main { padding: 1.25rem; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(10rem, 1fr)); gap: 1rem; }
.card { background: #fff; border-radius: .75rem; overflow: hidden; text-decoration: none; color: inherit; box-shadow: 0 1px 2px rgba(0,0,0,.06); }
.card-image { aspect-ratio: 1; background: #f5f5f4; }
.card-image img { width: 100%; height: 100%; object-fit: cover; }
.no-image { display: flex; align-items: center; justify-content: center; height: 100%; color: #a8a29e; font-size: .8rem; }
.card-body { padding: .75rem; }
.card-body h3 { font-size: .9375rem; font-weight: 500; }
.price { color: #ea580c; font-weight: 700; margin-top: .25rem; }
.spinner, .end { text-align: center; color: #78716c; padding: 1.5rem; }
.empty { text-align: center; padding: 4rem 1rem; color: #57534e; }
.empty .glyph { font-size: 3rem; margin-bottom: 1rem; }
.sentinel { height: 5rem; }
"#;

const FEED_SCRIPT: &str = r#"
const PAGE_LIMIT = 20;
let offset = INITIAL.offset;
let hasMore = INITIAL.hasMore;
let busy = false;

const spinner = document.getElementById('spinner');
const endMarker = document.getElementById('end-marker');

async function loadMore() {
    if (busy || !hasMore) return;
    busy = true;
    spinner.hidden = false;
    try {
        const resp = await fetch('?fragment=items&offset=' + offset);
        if (!resp.ok) throw new Error('HTTP ' + resp.status);
        const holder = document.createElement('div');
        holder.innerHTML = await resp.text();
        const state = holder.querySelector('#page-state');
        if (!state) throw new Error('fetch failed');
        const grid = document.getElementById('grid');
        holder.querySelectorAll('.card').forEach(c => grid.appendChild(c));
        hasMore = state.dataset.hasMore === 'true';
        offset += PAGE_LIMIT;
        endMarker.hidden = hasMore;
    } catch (e) {
        // Transient: keep the list, leave hasMore alone.
    } finally {
        busy = false;
        spinner.hidden = true;
    }
}

new IntersectionObserver(entries => {
    if (entries[0].isIntersecting && hasMore && !busy) {
        loadMore();
    }
}, { threshold: 0.1 }).observe(document.getElementById('sentinel'));
"#;
