//! HTML rendering for the listing detail page.

use chrono::{DateTime, Utc};

use quad_core::listing::ListingSummary;
use quad_core::viewer::Viewer;
use quad_feed::{FavoriteStatus, FavoriteToggle};

/// Render the detail page.
pub fn render_detail(
    listing: &ListingSummary,
    viewer: &Viewer,
    favorite: &FavoriteToggle,
) -> String {
    let cover = listing
        .cover_image()
        .map(|url| format!(r#"<img src="{}" alt="">"#, escape_html(url)))
        .unwrap_or_else(|| r#"<div class="no-image">No photo</div>"#.to_string());
    let image_count = listing.images.len().max(1);

    let seller = &listing.seller;
    let rating = if seller.rating > 0.0 {
        format!(
            r#"<span class="rating">&#9733; {:.1}</span>"#,
            seller.rating
        )
    } else {
        String::new()
    };
    let sales = if seller.completed_orders >= 5 {
        format!(
            r#"<span class="sales">{} sales</span>"#,
            seller.completed_orders
        )
    } else {
        String::new()
    };

    let tags = if listing.tags.is_empty() {
        String::new()
    } else {
        format!(
            r#"<div class="tags">{}</div>"#,
            listing
                .tags
                .iter()
                .map(|t| format!(r#"<span class="tag">#{}</span>"#, escape_html(t)))
                .collect::<String>()
        )
    };

    let category = listing
        .category
        .as_ref()
        .map(|c| format!(r#"<span class="category">{}</span>"#, escape_html(&c.name)))
        .unwrap_or_default();

    let fav_state = serde_json::json!({
        "id": listing.id.as_str(),
        "enabled": matches!(favorite.status(), FavoriteStatus::Settled(_)),
        "favorited": favorite.is_favorited(),
    });

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
<header class="top"><a href="/feed/all" class="back">&larr; Back</a></header>
<div class="gallery">
    {cover}
    <span class="count">1 / {image_count}</span>
</div>
<main>
    <h1 class="price">{price}</h1>
    <h2>{title}</h2>
    <a class="seller" href="/profile/{seller_id}">
        <div>
            <p class="name">{seller_name}</p>
            <p class="meta">{rating} {sales}</p>
        </div>
    </a>
    <div class="rows">
        <p><strong>Location:</strong> {hall}</p>
        <p><strong>Posted:</strong> {posted}</p>
    </div>
    <section class="description">
        <h3>Description</h3>
        <p>{description}</p>
    </section>
    {category}
    {tags}
</main>
<footer class="actions">
    {actions}
</footer>
<div id="toast" class="toast" hidden></div>
<script>const FAV = {fav_state};</script>
<script>{js}</script>
</body>
</html>"#,
        title = escape_html(&listing.title),
        css = DETAIL_STYLES,
        cover = cover,
        image_count = image_count,
        price = format_price(listing.price),
        seller_id = escape_html(seller.id.as_str()),
        seller_name = escape_html(&seller.name),
        rating = rating,
        sales = sales,
        hall = escape_html(seller.hall_of_residence.as_deref().unwrap_or("On campus")),
        posted = time_ago(listing.created_at, Utc::now()),
        description = escape_html(listing.description.as_deref().unwrap_or("")),
        category = category,
        tags = tags,
        fav_state = fav_state,
        actions = render_actions(listing, viewer),
        js = FAVORITE_SCRIPT,
    )
}

fn render_actions(listing: &ListingSummary, viewer: &Viewer) -> String {
    if viewer.owns(&listing.seller.id) {
        return format!(
            r#"<a class="btn primary" href="/create/listing?id={}">Edit listing</a>"#,
            escape_html(listing.id.as_str())
        );
    }
    if !viewer.is_authenticated() {
        return r#"<a class="btn primary" href="/login">Sign in to contact the seller</a>"#
            .to_string();
    }

    let phone = listing.seller.phone.as_deref().unwrap_or("");
    let phone_digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    format!(
        r#"<button id="fav" class="btn fav" aria-label="Save listing">&hearts;</button>
<a class="btn primary" target="_blank" rel="noopener noreferrer"
   href="https://wa.me/{digits}?text=Hi%2C%20I%27m%20interested%20in%20your%20listing%3A%20{title}">WhatsApp</a>
<a class="btn" href="tel:{phone}">Call</a>"#,
        digits = phone_digits,
        title = escape_html(&listing.title).replace(' ', "%20"),
        phone = escape_html(phone),
    )
}

pub fn render_listing_not_found() -> String {
    r#"<!DOCTYPE html><html><body><h1>Listing not found</h1>
<p>It may have been sold or taken down. <a href="/feed/all">Browse listings</a></p></body></html>"#
        .to_string()
}

pub fn render_load_error(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><body><h1>Failed to load listing</h1>
<p>{}</p><p><a href="">Try again</a></p></body></html>"#,
        escape_html(message)
    )
}

pub fn render_not_found() -> String {
    r#"<!DOCTYPE html><html><body><h1>Not found</h1></body></html>"#.to_string()
}

/// Relative post age, e.g. "3h ago".
pub fn time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds().max(0);
    match seconds {
        0..=59 => "just now".to_string(),
        60..=3599 => format!("{}m ago", seconds / 60),
        3600..=86_399 => format!("{}h ago", seconds / 3600),
        86_400..=604_799 => format!("{}d ago", seconds / 86_400),
        _ => format!("{}w ago", seconds / 604_800),
    }
}

pub fn format_price(price: u64) -> String {
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

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const DETAIL_STYLES: &str = r#"
* { box-sizing: border-box; margin: 0; }
body { font-family: system-ui, sans-serif; background: #fafaf9; color: #1c1917; padding-bottom: 6rem; }
.top { position: sticky; top: 0; background: #fff; border-bottom: 1px solid #e7e5e4; padding: 1rem 1.25rem; z-index: 10; }
.back { color: #44403c; text-decoration: none; font-weight: 500; }
.gallery { position: relative; aspect-ratio: 1; max-height: 32rem; background: #1c1917; }
.gallery img { width: 100%; height: 100%; object-fit: cover; }
.gallery .count { position: absolute; top: 1rem; right: 1rem; background: rgba(0,0,0,.7); color: #fff; padding: .25rem .75rem; border-radius: 9999px; font-size: .875rem; }
.no-image { display: flex; align-items: center; justify-content: center; height: 100%; color: #a8a29e; }
main { background: #fff; border-radius: 1.5rem 1.5rem 0 0; margin-top: -1.5rem; position: relative; padding: 1.5rem 1.25rem; }
.price { color: #ea580c; font-size: 1.75rem; }
main h2 { font-size: 1.375rem; margin-top: .25rem; }
.seller { display: block; margin-top: 1.25rem; padding: 1rem; background: #fafaf9; border: 1px solid #e7e5e4; border-radius: .75rem; text-decoration: none; color: inherit; }
.seller .name { font-weight: 600; }
.seller .meta { font-size: .875rem; color: #78716c; }
.rows { margin-top: 1.25rem; color: #44403c; display: flex; flex-direction: column; gap: .5rem; }
.description { margin-top: 1.5rem; }
.description h3 { margin-bottom: .5rem; }
.description p { white-space: pre-wrap; line-height: 1.6; color: #44403c; }
.category, .tag { display: inline-block; margin-top: 1rem; padding: .25rem .75rem; background: #f5f5f4; border-radius: 9999px; font-size: .875rem; }
.tag { background: #fff7ed; color: #9a3412; margin-right: .5rem; }
.actions { position: fixed; bottom: 0; left: 0; right: 0; display: flex; gap: .75rem; padding: 1rem 1.25rem; background: #fff; border-top: 1px solid #e7e5e4; }
.btn { flex: 1; display: flex; align-items: center; justify-content: center; padding: .875rem; border-radius: .75rem; border: 2px solid #d6d3d1; background: #fff; color: #44403c; font-size: 1rem; font-weight: 600; text-decoration: none; cursor: pointer; }
.btn.primary { background: #ea580c; border-color: #ea580c; color: #fff; }
.btn.fav { flex: 0 0 3.5rem; }
.btn.fav.on { border-color: #ea580c; color: #ea580c; background: #fff7ed; }
.btn.fav:disabled { opacity: .5; cursor: default; }
.toast { position: fixed; bottom: 6.5rem; left: 50%; transform: translateX(-50%); background: #1c1917; color: #fff; padding: .5rem 1rem; border-radius: .5rem; font-size: .875rem; }
"#;

const FAVORITE_SCRIPT: &str = r#"
const btn = document.getElementById('fav');
if (btn) {
    const PERSIST_DEBOUNCE_MS = 500;
    let shown = FAV.favorited;
    let timer = null;

    const paint = () => btn.classList.toggle('on', shown);
    paint();
    if (!FAV.enabled) btn.disabled = true;

    function toast(message) {
        const el = document.getElementById('toast');
        el.textContent = message;
        el.hidden = false;
        setTimeout(() => { el.hidden = true; }, 2500);
    }

    btn.addEventListener('click', () => {
        if (!FAV.enabled) return;
        // Optimistic flip; the persist call fires once clicks go quiet, and
        // each click re-arms the window carrying its own pre-toggle value.
        const pre = shown;
        shown = !pre;
        paint();
        clearTimeout(timer);
        timer = setTimeout(async () => {
            try {
                const resp = await fetch(
                    '/listing/' + FAV.id + '/favorite?desired=' + (shown ? 1 : 0),
                    { method: 'POST' }
                );
                if (!resp.ok) throw new Error('HTTP ' + resp.status);
            } catch (e) {
                shown = pre;
                paint();
                toast('Failed to update favorite');
            }
        }, PERSIST_DEBOUNCE_MS);
    });
}
"#;
