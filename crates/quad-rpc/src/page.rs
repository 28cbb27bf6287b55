//! Page envelope for feed and search batches.
//!
//! Pagination is offset-based. Every feed procedure replicates a boolean
//! `has_more` column onto each returned row; the client reads it from the
//! last row of the batch. When the column is absent entirely, an undersized
//! batch signals the end instead.

use serde::{Deserialize, Serialize};

use quad_core::listing::ListingSummary;

/// Fixed page size used by every feed procedure.
pub const PAGE_LIMIT: u32 = 20;

/// Wire row: a listing plus the pagination columns the backend attaches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRow {
    #[serde(flatten)]
    pub listing: ListingSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

/// A decoded batch of listings.
#[derive(Debug, Clone)]
pub struct ListingPage {
    /// Rows in backend order for the requested sort.
    pub items: Vec<ListingSummary>,
    /// Trailing sentinel: whether rows exist beyond this batch. `None` when
    /// the backend did not attach the column.
    pub more: Option<bool>,
    /// Total match count, when the backend computed one.
    pub total: Option<u64>,
}

impl ListingPage {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            more: None,
            total: None,
        }
    }

    /// Decode a batch of wire rows, pulling the sentinel off the last row.
    pub fn from_rows(rows: Vec<ListingRow>) -> Self {
        let more = rows.last().and_then(|r| r.has_more);
        let total = rows.last().and_then(|r| r.total_count);
        Self {
            items: rows.into_iter().map(|r| r.listing).collect(),
            more,
            total,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, has_more: Option<bool>) -> ListingRow {
        let listing: ListingSummary = serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Listing {id}"),
            "price": 1000,
            "seller": {"id": "usr-1", "name": "Ada"},
            "created_at": "2025-11-02T09:30:00Z"
        }))
        .unwrap();
        ListingRow {
            listing,
            has_more,
            total_count: None,
        }
    }

    #[test]
    fn test_sentinel_read_from_last_row() {
        let page = ListingPage::from_rows(vec![
            row("a", Some(true)),
            row("b", Some(true)),
            row("c", Some(false)),
        ]);
        assert_eq!(page.len(), 3);
        assert_eq!(page.more, Some(false));
    }

    #[test]
    fn test_missing_sentinel_is_none() {
        let page = ListingPage::from_rows(vec![row("a", None)]);
        assert_eq!(page.more, None);
    }

    #[test]
    fn test_empty_batch() {
        let page = ListingPage::from_rows(vec![]);
        assert!(page.is_empty());
        assert_eq!(page.more, None);
    }

    #[test]
    fn test_row_flatten_decodes() {
        let json = serde_json::json!({
            "id": "lst-5",
            "title": "Econ textbook",
            "price": 3500,
            "seller": {"id": "usr-2", "name": "Bisi"},
            "created_at": "2025-10-01T12:00:00Z",
            "has_more": true,
            "total_count": 41
        });
        let row: ListingRow = serde_json::from_value(json).unwrap();
        assert_eq!(row.has_more, Some(true));
        assert_eq!(row.total_count, Some(41));
        assert_eq!(row.listing.id.as_str(), "lst-5");
    }
}
