//! Backend RPC layer for Quadmart.
//!
//! This crate provides:
//! - `MarketBackend` - the backend procedure contract the client is written
//!   against
//! - `RpcClient` - PostgREST-style implementation over Spin outbound HTTP
//! - `ListingPage` - offset-paginated batch envelope with the `has_more`
//!   sentinel convention
//! - `TimeoutConfig` / `RetryPolicy` - per-fetch policies

mod backend;
mod client;
mod config;
mod error;
mod page;
mod retry;
mod timeout;

pub use backend::*;
pub use client::RpcClient;
pub use config::BackendConfig;
pub use error::RpcError;
pub use page::{ListingPage, ListingRow, PAGE_LIMIT};
pub use retry::{FetchPolicy, RetryPolicy};
pub use timeout::{TimeoutConfig, DEFAULT_FETCH_TIMEOUT};
