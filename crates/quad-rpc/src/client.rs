//! PostgREST-style backend client.
//!
//! Stored procedures are invoked as `POST /rest/v1/rpc/{name}`; the favorite
//! membership table is reached directly under `/rest/v1/favorites`. Outbound
//! HTTP goes through the Spin SDK and is therefore only available on wasm32;
//! native builds get stubs that fail loudly (tests talk to a mock backend,
//! not to this client).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use quad_core::category::Category;
use quad_core::ids::{ListingId, UserId};
use quad_core::listing::ListingSummary;

use crate::backend::{MarketBackend, PageParams, SearchParams, UserListingsParams};
use crate::config::BackendConfig;
use crate::error::RpcError;
use crate::page::{ListingPage, ListingRow};
use crate::retry::FetchPolicy;

/// HTTP verb for a backend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Get,
    Post,
    Delete,
}

/// Backend client with timeout/retry policy.
pub struct RpcClient {
    config: BackendConfig,
    policy: FetchPolicy,
}

impl RpcClient {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            policy: FetchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Invoke a stored procedure and decode its JSON result.
    async fn rpc<P, T>(&self, proc: &str, params: &P) -> Result<T, RpcError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let url = self.config.rest_url(&format!("rpc/{proc}"));
        let body = serde_json::to_vec(params).map_err(|e| RpcError::Request(e.to_string()))?;
        let bytes = self.send_with_retry(Verb::Post, &url, Some(body)).await?;
        serde_json::from_slice(&bytes).map_err(|e| RpcError::Deserialization(e.to_string()))
    }

    /// Invoke a feed procedure and decode the row batch into a page.
    async fn fetch_page<P: Serialize>(&self, proc: &str, params: &P) -> Result<ListingPage, RpcError> {
        let rows: Vec<ListingRow> = self.rpc(proc, params).await?;
        Ok(ListingPage::from_rows(rows))
    }

    async fn send_with_retry(
        &self,
        verb: Verb,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, RpcError> {
        let mut attempt = 0;
        loop {
            match self.send_once(verb, url, body.clone()).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if self.policy.retry.should_retry(&e, attempt) => attempt += 1,
                Err(e) => return Err(e),
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    async fn send_once(
        &self,
        verb: Verb,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, RpcError> {
        use spin_sdk::http::{Method, Request, Response};

        let method = match verb {
            Verb::Get => Method::Get,
            Verb::Post => Method::Post,
            Verb::Delete => Method::Delete,
        };

        let mut builder = Request::builder();
        builder
            .method(method)
            .uri(url)
            .header("apikey", &self.config.anon_key)
            .header(
                "authorization",
                format!("Bearer {}", self.config.bearer_token()),
            )
            .header("accept", "application/json");
        if let Some(body) = body {
            builder.header("content-type", "application/json");
            builder.body(body);
        }
        let req = builder.build();

        // TODO: enforce self.policy.timeout once the Spin SDK exposes a
        // deadline on outbound requests; today the gateway's own timeout is
        // the effective bound.
        let resp: Response = spin_sdk::http::send(req)
            .await
            .map_err(|e| RpcError::Connection(e.to_string()))?;

        let status = *resp.status();
        match status {
            200..=299 => Ok(resp.into_body()),
            401 | 403 => Err(RpcError::Unauthenticated),
            409 => Err(RpcError::Conflict),
            _ => {
                let bytes = resp.into_body();
                if is_duplicate_key(&bytes) {
                    Err(RpcError::Conflict)
                } else {
                    Err(RpcError::Http {
                        status,
                        url: url.to_string(),
                    })
                }
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn send_once(
        &self,
        _verb: Verb,
        _url: &str,
        _body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, RpcError> {
        Err(RpcError::Request(
            "outbound HTTP is only available on wasm32 (Spin)".to_string(),
        ))
    }
}

/// PostgreSQL unique-violation code, surfaced by the gateway in error bodies.
fn is_duplicate_key(body: &[u8]) -> bool {
    String::from_utf8_lossy(body).contains("23505")
}

/// Percent-encode a value for use inside a query-string filter.
fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '~' => out.push(c),
            _ => {
                for byte in c.to_string().as_bytes() {
                    out.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    out
}

#[async_trait(?Send)]
impl MarketBackend for RpcClient {
    async fn search_listings(&self, params: &SearchParams) -> Result<ListingPage, RpcError> {
        self.fetch_page("search_offers", params).await
    }

    async fn list_all(&self, page: PageParams) -> Result<ListingPage, RpcError> {
        self.fetch_page("get_all_products", &page).await
    }

    async fn list_hall(&self, page: PageParams) -> Result<ListingPage, RpcError> {
        self.fetch_page("get_hall_products", &page).await
    }

    async fn list_course(&self, page: PageParams) -> Result<ListingPage, RpcError> {
        self.fetch_page("get_course_products", &page).await
    }

    async fn list_user_listings(
        &self,
        params: &UserListingsParams,
    ) -> Result<ListingPage, RpcError> {
        self.fetch_page("get_user_offers", params).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RpcError> {
        let url = self.config.rest_url("categories?select=*");
        let bytes = self.send_with_retry(Verb::Get, &url, None).await?;
        serde_json::from_slice(&bytes).map_err(|e| RpcError::Deserialization(e.to_string()))
    }

    async fn get_listing(&self, id: &ListingId) -> Result<Option<ListingSummary>, RpcError> {
        let rows: Vec<ListingRow> = self
            .rpc("get_offer", &serde_json::json!({ "offer_id": id }))
            .await?;
        Ok(rows.into_iter().next().map(|r| r.listing))
    }

    async fn favorite_status(
        &self,
        user: &UserId,
        listing: &ListingId,
    ) -> Result<bool, RpcError> {
        let url = self.config.rest_url(&format!(
            "favorites?select=offer_id&user_id=eq.{}&offer_id=eq.{}",
            encode_component(user.as_str()),
            encode_component(listing.as_str())
        ));
        let bytes = self.send_with_retry(Verb::Get, &url, None).await?;
        let rows: Vec<serde_json::Value> = serde_json::from_slice(&bytes)
            .map_err(|e| RpcError::Deserialization(e.to_string()))?;
        Ok(!rows.is_empty())
    }

    async fn set_favorite(&self, user: &UserId, listing: &ListingId) -> Result<(), RpcError> {
        let url = self.config.rest_url("favorites");
        let body = serde_json::to_vec(&serde_json::json!({
            "user_id": user,
            "offer_id": listing,
        }))
        .map_err(|e| RpcError::Request(e.to_string()))?;
        // No retry: a replayed insert would just turn into a conflict.
        self.send_once(Verb::Post, &url, Some(body)).await?;
        Ok(())
    }

    async fn unset_favorite(&self, user: &UserId, listing: &ListingId) -> Result<(), RpcError> {
        let url = self.config.rest_url(&format!(
            "favorites?user_id=eq.{}&offer_id=eq.{}",
            encode_component(user.as_str()),
            encode_component(listing.as_str())
        ));
        self.send_once(Verb::Delete, &url, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_detection() {
        assert!(is_duplicate_key(
            br#"{"code":"23505","message":"duplicate key value"}"#
        ));
        assert!(!is_duplicate_key(br#"{"code":"PGRST116"}"#));
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("usr-1"), "usr-1");
        assert_eq!(encode_component("a b&c"), "a%20b%26c");
    }
}
