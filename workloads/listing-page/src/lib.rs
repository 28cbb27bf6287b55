//! Listing detail route.
//!
//! `GET /listing/{id}` renders the detail page; when the viewer is signed in
//! the favorite control is seeded with its current membership state.
//! `POST /listing/{id}/favorite?desired=0|1` persists the net desired state
//! the client glue settled on after its debounce window — a duplicate-row
//! conflict counts as success.
//!
//! The auth gateway in front of this component resolves the session and
//! forwards the viewer as `x-viewer-id`/`x-viewer-name` (plus the access
//! token in `x-viewer-token`); session issuance itself happens elsewhere.

mod render;

use futures::SinkExt;
use spin_sdk::http::{Fields, IncomingRequest, Method, OutgoingResponse, ResponseOutparam};
use spin_sdk::http_component;

use quad_core::ids::{ListingId, UserId};
use quad_core::log::Logger;
use quad_core::viewer::{UserProfile, Viewer};
use quad_feed::FavoriteToggle;
use quad_rpc::{BackendConfig, MarketBackend, RpcClient, RpcError};

/// Listing detail handler.
#[http_component]
async fn handle_listing(req: IncomingRequest, response_out: ResponseOutparam) {
    let log = Logger::new().with_component("listing-page");

    let path_with_query = req.path_with_query().unwrap_or_default();
    let (path, query_string) = match path_with_query.split_once('?') {
        Some((p, q)) => (p.to_string(), q.to_string()),
        None => (path_with_query.clone(), String::new()),
    };

    let viewer = viewer_from_headers(&req);

    let mut config = match BackendConfig::from_environment() {
        Ok(config) => config,
        Err(e) => {
            log.error(&format!("backend config unavailable: {e:#}"));
            respond(response_out, 500, "<h1>Service unavailable</h1>".to_string()).await;
            return;
        }
    };
    if let Some(token) = header_value(&req, "x-viewer-token") {
        config = config.with_bearer(token);
    }
    let backend = RpcClient::new(config);

    match (req.method(), parse_route(&path)) {
        (Method::Get, Some(Route::Detail(id))) => {
            let (status, html) = detail_response(&backend, &viewer, &id).await;
            respond(response_out, status, html).await;
        }
        (Method::Post, Some(Route::Favorite(id))) => {
            let desired = query_param(&query_string, "desired").as_deref() == Some("1");
            let (status, body) = favorite_response(&backend, &viewer, &id, desired).await;
            respond_json(response_out, status, body).await;
        }
        _ => {
            respond(response_out, 404, render::render_not_found()).await;
        }
    }
}

enum Route {
    Detail(ListingId),
    Favorite(ListingId),
}

/// `/listing/{id}` and `/listing/{id}/favorite`.
fn parse_route(path: &str) -> Option<Route> {
    let mut segments = path.trim_matches('/').split('/');
    if segments.next() != Some("listing") {
        return None;
    }
    let id = segments.next().filter(|s| !s.is_empty())?;
    match segments.next() {
        None => Some(Route::Detail(ListingId::new(id))),
        Some("favorite") => Some(Route::Favorite(ListingId::new(id))),
        Some(_) => None,
    }
}

async fn detail_response(
    backend: &RpcClient,
    viewer: &Viewer,
    id: &ListingId,
) -> (u16, String) {
    match backend.get_listing(id).await {
        Ok(Some(listing)) => {
            let mut favorite = FavoriteToggle::new(id.clone());
            if let Some(user_id) = viewer.user_id() {
                // Seed the control; a failed probe leaves it unresolved and
                // therefore inert, never broken.
                if let Ok(favorited) = backend.favorite_status(user_id, id).await {
                    favorite.resolve_status(favorited);
                }
            }
            (200, render::render_detail(&listing, viewer, &favorite))
        }
        Ok(None) => (404, render::render_listing_not_found()),
        Err(e) => (200, render::render_load_error(&e.to_string())),
    }
}

async fn favorite_response(
    backend: &RpcClient,
    viewer: &Viewer,
    id: &ListingId,
    desired: bool,
) -> (u16, String) {
    let Some(user_id) = viewer.user_id() else {
        return (
            401,
            serde_json::json!({"error": "sign_in_required"}).to_string(),
        );
    };
    let result = if desired {
        backend.set_favorite(user_id, id).await
    } else {
        backend.unset_favorite(user_id, id).await
    };
    match result {
        // The row already existed: membership holds, success.
        Ok(()) | Err(RpcError::Conflict) => (
            200,
            serde_json::json!({"favorited": desired}).to_string(),
        ),
        Err(e) => (
            502,
            serde_json::json!({"error": e.to_string()}).to_string(),
        ),
    }
}

fn viewer_from_headers(req: &IncomingRequest) -> Viewer {
    let Some(id) = header_value(req, "x-viewer-id") else {
        return Viewer::anonymous();
    };
    Viewer::signed_in(UserProfile {
        id: UserId::new(id),
        name: header_value(req, "x-viewer-name").unwrap_or_default(),
        hall_of_residence: None,
        course: None,
        avatar: None,
    })
}

fn header_value(req: &IncomingRequest, name: &str) -> Option<String> {
    req.headers()
        .get(&name.to_string())
        .first()
        .map(|v| String::from_utf8_lossy(v).into_owned())
        .filter(|v| !v.is_empty())
}

fn query_param(query_string: &str, key: &str) -> Option<String> {
    query_string.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        (parts.next() == Some(key)).then(|| parts.next().unwrap_or("").to_string())
    })
}

async fn respond(response_out: ResponseOutparam, status: u16, html: String) {
    respond_with(response_out, status, "text/html; charset=utf-8", html).await;
}

async fn respond_json(response_out: ResponseOutparam, status: u16, body: String) {
    respond_with(response_out, status, "application/json", body).await;
}

async fn respond_with(
    response_out: ResponseOutparam,
    status: u16,
    content_type: &str,
    body_text: String,
) {
    let header_list: Vec<(String, Vec<u8>)> =
        vec![("content-type".to_owned(), content_type.as_bytes().to_vec())];
    let headers = Fields::from_list(&header_list).unwrap();
    let response = OutgoingResponse::new(headers);
    response.set_status_code(status).unwrap();
    let mut body = response.take_body();
    response_out.set(response);
    if let Err(e) = body.send(body_text.into_bytes()).await {
        eprintln!("failed to send response body: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_parsing() {
        assert!(matches!(
            parse_route("/listing/lst-1"),
            Some(Route::Detail(id)) if id.as_str() == "lst-1"
        ));
        assert!(matches!(
            parse_route("/listing/lst-1/favorite"),
            Some(Route::Favorite(id)) if id.as_str() == "lst-1"
        ));
        assert!(parse_route("/listing/").is_none());
        assert!(parse_route("/listing/lst-1/photos").is_none());
        assert!(parse_route("/profile/usr-1").is_none());
    }
}
