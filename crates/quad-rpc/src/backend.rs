//! The backend procedure contract.
//!
//! Everything hard about search (ranking, text matching, tag scoring) lives
//! in the backend's stored procedures; this trait is the black-box seam the
//! rest of the client is written against. Param structs serialize with the
//! exact argument names the procedures declare.

use async_trait::async_trait;
use serde::Serialize;

use quad_core::category::Category;
use quad_core::ids::{CategoryId, ListingId, UserId};
use quad_core::listing::{Condition, ListingStatus, ListingSummary, OfferType, SortBy};

use crate::error::RpcError;
use crate::page::{ListingPage, PAGE_LIMIT};

/// Arguments for the `search_offers` procedure.
#[derive(Debug, Clone, Serialize)]
pub struct SearchParams {
    pub search_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_category_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_offer_type: Option<OfferType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_condition: Option<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_hall: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_price_min: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_price_max: Option<u64>,
    pub sort_by: SortBy,
    pub page_limit: u32,
    pub page_offset: u32,
}

/// Arguments for the plain feed procedures (`get_all_products` and friends).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageParams {
    pub page_limit: u32,
    pub page_offset: u32,
}

impl PageParams {
    /// The first page.
    pub fn first() -> Self {
        Self::at(0)
    }

    /// The page starting at `offset`.
    pub fn at(offset: u32) -> Self {
        Self {
            page_limit: PAGE_LIMIT,
            page_offset: offset,
        }
    }
}

/// Arguments for the `get_user_offers` procedure.
#[derive(Debug, Clone, Serialize)]
pub struct UserListingsParams {
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_status: Option<ListingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_type: Option<OfferType>,
    pub page_limit: u32,
    pub page_offset: u32,
}

impl UserListingsParams {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            filter_status: None,
            filter_type: None,
            page_limit: PAGE_LIMIT,
            page_offset: 0,
        }
    }

    pub fn with_status(mut self, status: ListingStatus) -> Self {
        self.filter_status = Some(status);
        self
    }

    pub fn with_type(mut self, offer_type: OfferType) -> Self {
        self.filter_type = Some(offer_type);
        self
    }

    pub fn at(mut self, offset: u32) -> Self {
        self.page_offset = offset;
        self
    }
}

/// Remote procedures the marketplace client depends on.
///
/// `?Send` because the Spin executor is single-threaded and its outbound
/// HTTP futures are not `Send`.
#[async_trait(?Send)]
pub trait MarketBackend {
    /// Faceted catalog search, ranked server-side.
    async fn search_listings(&self, params: &SearchParams) -> Result<ListingPage, RpcError>;

    /// Everything on campus, newest first.
    async fn list_all(&self, page: PageParams) -> Result<ListingPage, RpcError>;

    /// Listings from the viewer's hall of residence.
    async fn list_hall(&self, page: PageParams) -> Result<ListingPage, RpcError>;

    /// Listings relevant to the viewer's course.
    async fn list_course(&self, page: PageParams) -> Result<ListingPage, RpcError>;

    /// One seller's listings, optionally filtered by status/type.
    async fn list_user_listings(
        &self,
        params: &UserListingsParams,
    ) -> Result<ListingPage, RpcError>;

    /// Category reference data for the filter sheet. Non-critical.
    async fn list_categories(&self) -> Result<Vec<Category>, RpcError>;

    /// One listing with full description, or `None` if it does not exist.
    async fn get_listing(&self, id: &ListingId) -> Result<Option<ListingSummary>, RpcError>;

    /// Whether `user` has favorited `listing`.
    async fn favorite_status(&self, user: &UserId, listing: &ListingId)
        -> Result<bool, RpcError>;

    /// Insert a favorite membership row. A duplicate row surfaces as
    /// `RpcError::Conflict`; callers treat that as success.
    async fn set_favorite(&self, user: &UserId, listing: &ListingId) -> Result<(), RpcError>;

    /// Delete a favorite membership row. Deleting a row that does not exist
    /// succeeds.
    async fn unset_favorite(&self, user: &UserId, listing: &ListingId) -> Result<(), RpcError>;
}
