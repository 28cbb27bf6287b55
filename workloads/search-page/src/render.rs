//! HTML rendering for the search page.

use quad_core::category::Category;
use quad_core::listing::{Condition, ListingSummary, SortBy};
use quad_feed::FeedSession;

/// Halls of residence offered by the location filter.
const HALLS: &[(&str, &str)] = &[
    ("queen-elizabeth", "Queen Elizabeth II Hall"),
    ("queen-idia", "Queen Idia Hall"),
    ("obafemi-awolowo", "Awo Hall"),
    ("mellanby", "Mellanby Hall"),
    ("tedder", "Tedder Hall"),
    ("kuti", "Kuti Hall"),
    ("sultan-bello", "Sultan Bello Hall"),
    ("independence", "Great Independence Hall"),
    ("nnamdi-azikiwe", "Nnamdi Azikiwe Hall"),
    ("alexander-brown-hall", "Alexander Brown Hall (ABH)"),
    ("off-campus", "Off Campus"),
];

/// Render the full search page around an already-fetched first window.
pub fn render_page(session: &FeedSession, categories: &[Category]) -> String {
    let query = session.query();
    let initial = serde_json::json!({
        "offset": session.next_offset(),
        "hasMore": session.has_more(),
    });

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Search - Quadmart</title>
<style>{css}</style>
</head>
<body>
<header class="banner">
    <a href="/" class="back" aria-label="Go back">&larr;</a>
    <h1>Search</h1>
    <p>Find what you need on campus</p>
</header>
<div class="search-bar">
    <input id="q" type="search" placeholder="Search items on campus" value="{q}" autocomplete="off">
</div>
<div class="chips" id="sort-chips">
    {sort_chips}
</div>
<details class="filters" {filters_open}>
    <summary>Filters{filter_badge}</summary>
    <div class="filter-grid">
        <label>Category
            <select id="f-category">
                <option value="">All categories</option>
                {category_options}
            </select>
        </label>
        <label>Condition
            <select id="f-condition">
                <option value="">Any</option>
                {condition_options}
            </select>
        </label>
        <label>Location
            <select id="f-hall">
                <option value="">All locations</option>
                {hall_options}
            </select>
        </label>
        <label>Price min
            <input id="f-price-min" type="number" min="0" placeholder="Min" value="{price_min}">
        </label>
        <label>Price max
            <input id="f-price-max" type="number" min="0" placeholder="Max" value="{price_max}">
        </label>
        <button type="button" id="f-clear">Clear</button>
    </div>
</details>
<main>
    <div id="results">{results}</div>
    <div id="spinner" class="spinner" hidden>Loading&hellip;</div>
    <div id="end-marker" class="end" {end_hidden}>You've reached the end!</div>
    <div id="sentinel" class="sentinel"></div>
</main>
<script>const INITIAL = {initial};</script>
<script>{js}</script>
</body>
</html>"#,
        css = SEARCH_STYLES,
        q = escape_html(&query.text),
        sort_chips = render_sort_chips(query.sort_by),
        filters_open = if query.active_filter_count() > 0 {
            "open"
        } else {
            ""
        },
        filter_badge = if query.active_filter_count() > 0 {
            format!(" ({})", query.active_filter_count())
        } else {
            String::new()
        },
        category_options = render_category_options(categories, session),
        condition_options = render_condition_options(session),
        hall_options = render_hall_options(session),
        price_min = query.price_min.map(|p| p.to_string()).unwrap_or_default(),
        price_max = query.price_max.map(|p| p.to_string()).unwrap_or_default(),
        results = render_results(session),
        end_hidden = if session.end_reached() { "" } else { "hidden" },
        initial = initial,
        js = SEARCH_SCRIPT,
    )
}

fn render_sort_chips(active: SortBy) -> String {
    [SortBy::Newest, SortBy::Cheapest, SortBy::Popular]
        .iter()
        .map(|sort| {
            format!(
                r#"<button type="button" class="chip{}" data-sort="{}">{}</button>"#,
                if *sort == active { " active" } else { "" },
                sort.as_str(),
                sort.display_name()
            )
        })
        .collect()
}

fn render_category_options(categories: &[Category], session: &FeedSession) -> String {
    let selected = session.query().category.as_ref();
    categories
        .iter()
        .map(|c| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                escape_html(c.id.as_str()),
                if selected == Some(&c.id) {
                    " selected"
                } else {
                    ""
                },
                escape_html(&c.name)
            )
        })
        .collect()
}

fn render_condition_options(session: &FeedSession) -> String {
    let selected = session.query().condition;
    [Condition::New, Condition::FairlyUsed, Condition::Used]
        .iter()
        .map(|c| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                c.as_str(),
                if selected == Some(*c) { " selected" } else { "" },
                c.display_name()
            )
        })
        .collect()
}

fn render_hall_options(session: &FeedSession) -> String {
    let selected = session.query().hall.as_deref();
    HALLS
        .iter()
        .map(|(value, label)| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                value,
                if selected == Some(*value) {
                    " selected"
                } else {
                    ""
                },
                label
            )
        })
        .collect()
}

/// The results region: error, empty state, or the card grid.
fn render_results(session: &FeedSession) -> String {
    if let Some(error) = session.error() {
        return render_error_state(error);
    }
    if session.is_empty_result() {
        return render_empty_state();
    }
    format!(
        r#"<div class="grid" id="grid">{}</div>"#,
        session
            .items()
            .iter()
            .map(render_card)
            .collect::<String>()
    )
}

pub fn render_card(listing: &ListingSummary) -> String {
    let cover = listing
        .cover_image()
        .map(|url| format!(r#"<img src="{}" alt="" loading="lazy">"#, escape_html(url)))
        .unwrap_or_else(|| r#"<div class="no-image">No photo</div>"#.to_string());
    let hall = listing
        .seller
        .hall_of_residence
        .as_deref()
        .map(|h| format!(r#"<span class="hall">{}</span>"#, escape_html(h)))
        .unwrap_or_default();

    format!(
        r#"<a class="card" href="/listing/{id}">
    <div class="card-image">{cover}</div>
    <div class="card-body">
        <h3>{title}</h3>
        <p class="price">{price}</p>
        {hall}
    </div>
</a>"#,
        id = escape_html(listing.id.as_str()),
        cover = cover,
        title = escape_html(&listing.title),
        price = format_price(listing.price),
        hall = hall,
    )
}

fn render_empty_state() -> String {
    r#"<div class="empty">
    <h3>No results found</h3>
    <p>Try different keywords or adjust your filters</p>
</div>"#
        .to_string()
}

fn render_error_state(message: &str) -> String {
    format!(
        r#"<div class="error">
    <h3>Something went wrong</h3>
    <p>{}</p>
    <p>Change a filter or scroll to retry.</p>
</div>"#,
        escape_html(message)
    )
}

/// One result window for the client glue. The trailing marker carries the
/// pagination state so the glue never guesses.
pub fn render_fragment(items: &[ListingSummary], has_more: bool) -> String {
    format!(
        r#"{}<template id="page-state" data-has-more="{}" data-count="{}"></template>"#,
        items.iter().map(render_card).collect::<String>(),
        has_more,
        items.len(),
    )
}

pub fn render_fragment_error(message: &str) -> String {
    // No page-state marker: the glue keeps its current state and clears the
    // spinner, exactly like any other transient failure.
    format!(
        r#"<template id="page-error" data-message="{}"></template>"#,
        escape_html(message)
    )
}

pub fn render_config_error() -> String {
    r#"<!DOCTYPE html><html><body><h1>Service unavailable</h1>
<p>The marketplace backend is not configured.</p></body></html>"#
        .to_string()
}

pub fn format_price(price: u64) -> String {
    // Thousands separators, e.g. 45000 -> ₦45,000.
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

/// HTML escape to prevent XSS.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const SEARCH_STYLES: &str = r#"
* { box-sizing: border-box; margin: 0; }
body { font-family: system-ui, sans-serif; background: #fafaf9; color: #1c1917; }
.banner { background: linear-gradient(135deg, #f97316, #c2410c); color: #fff; padding: 1.25rem; }
.banner p { color: #ffedd5; font-size: .875rem; }
.banner .back { color: #fff; text-decoration: none; font-size: 1.25rem; }
.search-bar { position: sticky; top: 0; background: #fafaf9; padding: .75rem 1.25rem; border-bottom: 1px solid #e7e5e4; z-index: 10; }
.search-bar input { width: 100%; max-width: 40rem; padding: .75rem 1rem; border: 2px solid #e7e5e4; border-radius: .75rem; font-size: 1rem; }
.chips { display: flex; gap: .5rem; padding: .75rem 1.25rem; overflow-x: auto; }
.chip { padding: .375rem .75rem; border-radius: 9999px; border: 1px solid #e7e5e4; background: #fff; cursor: pointer; white-space: nowrap; }
.chip.active { background: #1c1917; color: #fff; border-color: #1c1917; }
.filters { padding: 0 1.25rem .75rem; }
.filters summary { cursor: pointer; font-weight: 600; }
.filter-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(10rem, 1fr)); gap: .75rem; padding-top: .75rem; }
.filter-grid label { display: flex; flex-direction: column; gap: .25rem; font-size: .875rem; }
.filter-grid select, .filter-grid input { padding: .5rem; border: 2px solid #e7e5e4; border-radius: .5rem; }
main { padding: 1.25rem; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(10rem, 1fr)); gap: 1rem; }
.card { background: #fff; border-radius: .75rem; overflow: hidden; text-decoration: none; color: inherit; box-shadow: 0 1px 2px rgba(0,0,0,.06); }
.card-image { aspect-ratio: 1; background: #f5f5f4; }
.card-image img { width: 100%; height: 100%; object-fit: cover; }
.no-image { display: flex; align-items: center; justify-content: center; height: 100%; color: #a8a29e; font-size: .8rem; }
.card-body { padding: .75rem; }
.card-body h3 { font-size: .9375rem; font-weight: 500; }
.price { color: #ea580c; font-weight: 700; margin-top: .25rem; }
.hall { font-size: .75rem; color: #78716c; }
.spinner, .end { text-align: center; color: #78716c; padding: 1.5rem; }
.empty, .error { text-align: center; padding: 4rem 1rem; color: #57534e; }
.sentinel { height: 5rem; }
"#;

const SEARCH_SCRIPT: &str = r#"
const PAGE_LIMIT = 20;
const DEBOUNCE_MS = 300;
let offset = INITIAL.offset;
let hasMore = INITIAL.hasMore;
let busy = false;
let firstLoaded = true;
let debounceTimer = null;

const grid = () => document.getElementById('grid');
const results = document.getElementById('results');
const spinner = document.getElementById('spinner');
const endMarker = document.getElementById('end-marker');

function currentParams() {
    const p = new URLSearchParams();
    const set = (k, v) => { if (v) p.set(k, v); };
    set('q', document.getElementById('q').value.trim());
    const sort = document.querySelector('#sort-chips .chip.active');
    if (sort && sort.dataset.sort !== 'newest') p.set('sort', sort.dataset.sort);
    set('category', document.getElementById('f-category').value);
    set('condition', document.getElementById('f-condition').value);
    set('hall', document.getElementById('f-hall').value);
    set('price_min', document.getElementById('f-price-min').value);
    set('price_max', document.getElementById('f-price-max').value);
    return p;
}

// Every dispatched search writes the query string first, so the URL in the
// address bar always reproduces what is on screen.
function syncUrl(params) {
    const qs = params.toString();
    history.replaceState(null, '', qs ? '?' + qs : location.pathname);
}

async function runSearch(reset) {
    if (busy) return;
    busy = true;
    spinner.hidden = false;
    const requested = reset ? 0 : offset;
    const params = currentParams();
    params.set('fragment', 'items');
    params.set('offset', String(requested));
    try {
        const resp = await fetch('?' + params.toString());
        if (!resp.ok) throw new Error('HTTP ' + resp.status);
        const holder = document.createElement('div');
        holder.innerHTML = await resp.text();
        const state = holder.querySelector('#page-state');
        if (!state) throw new Error('fetch failed');
        const cards = Array.from(holder.querySelectorAll('.card'));
        if (reset) {
            results.innerHTML = '<div class="grid" id="grid"></div>';
        }
        cards.forEach(c => grid().appendChild(c));
        if (reset && cards.length === 0) {
            results.innerHTML = '<div class="empty"><h3>No results found</h3>' +
                '<p>Try different keywords or adjust your filters</p></div>';
        }
        hasMore = state.dataset.hasMore === 'true';
        offset = requested + PAGE_LIMIT;
        endMarker.hidden = hasMore || cards.length === 0 && reset;
    } catch (e) {
        // Transient: keep what is on screen, leave hasMore alone.
    } finally {
        busy = false;
        spinner.hidden = true;
        firstLoaded = true;
    }
}

function dispatch() {
    syncUrl(currentParams());
    hasMore = true;
    runSearch(true);
}

// Free text: last-write-wins debounce.
document.getElementById('q').addEventListener('input', () => {
    clearTimeout(debounceTimer);
    debounceTimer = setTimeout(dispatch, DEBOUNCE_MS);
});

// Discrete filters: immediate dispatch.
document.querySelectorAll('#sort-chips .chip').forEach(chip => {
    chip.addEventListener('click', () => {
        document.querySelectorAll('#sort-chips .chip').forEach(c => c.classList.remove('active'));
        chip.classList.add('active');
        dispatch();
    });
});
['f-category', 'f-condition', 'f-hall', 'f-price-min', 'f-price-max'].forEach(id => {
    document.getElementById(id).addEventListener('change', dispatch);
});
document.getElementById('f-clear').addEventListener('click', () => {
    ['f-category', 'f-condition', 'f-hall', 'f-price-min', 'f-price-max'].forEach(id => {
        document.getElementById(id).value = '';
    });
    dispatch();
});

// Infinite scroll: all guards checked at trigger time.
new IntersectionObserver(entries => {
    if (entries[0].isIntersecting && hasMore && !busy && firstLoaded) {
        runSearch(false);
    }
}, { threshold: 0.1 }).observe(document.getElementById('sentinel'));
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price_grouping() {
        assert_eq!(format_price(0), "₦0");
        assert_eq!(format_price(950), "₦950");
        assert_eq!(format_price(45000), "₦45,000");
        assert_eq!(format_price(1250000), "₦1,250,000");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"fan" & 'iron'</b>"#),
            "&lt;b&gt;&quot;fan&quot; &amp; &#39;iron&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_fragment_carries_page_state() {
        let html = render_fragment(&[], false);
        assert!(html.contains(r#"data-has-more="false""#));
        assert!(html.contains(r#"data-count="0""#));
    }
}
