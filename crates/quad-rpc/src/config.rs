//! Backend endpoint configuration.
//!
//! Workloads read the endpoint and anon key from Spin variables; native
//! builds (tests, tooling) fall back to environment variables of the same
//! names.

use anyhow::{Context, Result};

/// Connection settings for the backend REST gateway.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://abc123.supabase.co`.
    pub base_url: String,
    /// Public (anon) API key sent on every request.
    pub anon_key: String,
    /// Per-viewer access token, when a session exists.
    pub bearer: Option<String>,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            anon_key: anon_key.into(),
            bearer: None,
        }
    }

    /// Attach a viewer's access token.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Load from Spin variables (`backend_url`, `backend_anon_key`).
    #[cfg(target_arch = "wasm32")]
    pub fn from_environment() -> Result<Self> {
        let base_url = spin_sdk::variables::get("backend_url")
            .context("missing Spin variable: backend_url")?;
        let anon_key = spin_sdk::variables::get("backend_anon_key")
            .context("missing Spin variable: backend_anon_key")?;
        Ok(Self::new(base_url, anon_key))
    }

    /// Load from process environment (`BACKEND_URL`, `BACKEND_ANON_KEY`).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_environment() -> Result<Self> {
        let base_url = std::env::var("BACKEND_URL").context("missing env var: BACKEND_URL")?;
        let anon_key =
            std::env::var("BACKEND_ANON_KEY").context("missing env var: BACKEND_ANON_KEY")?;
        Ok(Self::new(base_url, anon_key))
    }

    /// Full URL for a REST path, e.g. `rest_url("rpc/search_offers")`.
    pub fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// The token presented as the bearer: the viewer's, or the anon key.
    pub fn bearer_token(&self) -> &str {
        self.bearer.as_deref().unwrap_or(&self.anon_key)
    }
}
