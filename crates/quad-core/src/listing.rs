//! Listing types as returned by the feed and search procedures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::ids::{ListingId, UserId};

/// Whether a listing offers a physical item or a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    Product,
    Service,
}

impl OfferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferType::Product => "product",
            OfferType::Service => "service",
        }
    }

    /// Parse a wire/URL value. Anything unrecognized is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "product" => Some(OfferType::Product),
            "service" => Some(OfferType::Service),
            _ => None,
        }
    }
}

/// Physical condition of a product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    New,
    FairlyUsed,
    Used,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::New => "new",
            Condition::FairlyUsed => "fairly_used",
            Condition::Used => "used",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Condition::New),
            "fairly_used" => Some(Condition::FairlyUsed),
            "used" => Some(Condition::Used),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Condition::New => "New",
            Condition::FairlyUsed => "Fairly used",
            Condition::Used => "Used",
        }
    }
}

/// Listing lifecycle status. Set by the seller, enforced by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Paused,
    Deleted,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Paused => "paused",
            ListingStatus::Deleted => "deleted",
        }
    }
}

/// How feed results are ordered. The ordering itself happens server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Most recently posted first.
    #[default]
    Newest,
    /// Lowest price first.
    Cheapest,
    /// Most viewed/favorited first.
    Popular,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Newest => "newest",
            SortBy::Cheapest => "cheapest",
            SortBy::Popular => "popular",
        }
    }

    /// Parse a wire/URL value, falling back to the default ordering.
    pub fn parse(s: &str) -> Self {
        match s {
            "cheapest" => SortBy::Cheapest,
            "popular" => SortBy::Popular,
            _ => SortBy::Newest,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SortBy::Newest => "Newest",
            SortBy::Cheapest => "Cheapest",
            SortBy::Popular => "Popular",
        }
    }
}

/// Seller details embedded in each listing row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerSummary {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub hall_of_residence: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub completed_orders: u32,
    /// Contact number for the WhatsApp/call actions on the detail page.
    #[serde(default)]
    pub phone: Option<String>,
}

/// A listing row.
///
/// The feed procedures return the summary fields; `get_offer` additionally
/// fills `description`. The client treats every field as read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSummary {
    pub id: ListingId,
    pub title: String,
    /// Asking price in whole naira.
    pub price: u64,
    /// Image URLs; the first one is the cover.
    #[serde(default)]
    pub images: Vec<String>,
    pub seller: SellerSummary,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub offer_type: Option<OfferType>,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ListingSummary {
    /// The cover image, if the backend supplied any images at all.
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_parse_fallback() {
        assert_eq!(SortBy::parse("cheapest"), SortBy::Cheapest);
        assert_eq!(SortBy::parse("popular"), SortBy::Popular);
        assert_eq!(SortBy::parse("newest"), SortBy::Newest);
        assert_eq!(SortBy::parse("definitely-not-a-sort"), SortBy::Newest);
        assert_eq!(SortBy::parse(""), SortBy::Newest);
    }

    #[test]
    fn test_condition_round_trip() {
        for c in [Condition::New, Condition::FairlyUsed, Condition::Used] {
            assert_eq!(Condition::parse(c.as_str()), Some(c));
        }
        assert_eq!(Condition::parse("like_new"), None);
    }

    #[test]
    fn test_offer_type_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&OfferType::Service).unwrap(),
            r#""service""#
        );
    }

    #[test]
    fn test_listing_deserializes_with_defaults() {
        let json = r#"{
            "id": "lst-1",
            "title": "Mini fridge",
            "price": 45000,
            "seller": {"id": "usr-9", "name": "Ada"},
            "created_at": "2025-11-02T09:30:00Z"
        }"#;
        let listing: ListingSummary = serde_json::from_str(json).unwrap();
        assert!(listing.images.is_empty());
        assert!(listing.cover_image().is_none());
        assert!(listing.tags.is_empty());
        assert_eq!(listing.seller.completed_orders, 0);
    }
}
