//! The active search query and its URL representation.
//!
//! The query round-trips through the address bar so searches are shareable
//! and the back button works. Parsing is total: malformed values fall back to
//! defaults, never to an error.

use quad_core::ids::CategoryId;
use quad_core::listing::{Condition, OfferType, SortBy};
use quad_rpc::{SearchParams, PAGE_LIMIT};

/// The current search: free text plus discrete filters plus ordering.
///
/// Plain data; mutating a field never fetches by itself. Dispatch timing
/// lives in [`crate::session::FeedSession`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchQuery {
    /// Free-text term, matched server-side, case-insensitive.
    pub text: String,
    pub category: Option<CategoryId>,
    pub offer_type: Option<OfferType>,
    pub condition: Option<Condition>,
    pub hall: Option<String>,
    /// Inclusive lower price bound.
    pub price_min: Option<u64>,
    /// Inclusive upper price bound.
    pub price_max: Option<u64>,
    pub sort_by: SortBy,
}

impl SearchQuery {
    /// Parse from a URL query string (`q=fan&sort=cheapest&price_min=500`).
    ///
    /// Unknown keys are ignored; unparseable values become their defaults.
    pub fn from_url_params(qs: &str) -> Self {
        let mut query = SearchQuery::default();
        for pair in qs.split('&') {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next().unwrap_or("");
            let value = decode_component(parts.next().unwrap_or(""));
            match key {
                "q" => query.text = value,
                "type" => query.offer_type = OfferType::parse(&value),
                "sort" => query.sort_by = SortBy::parse(&value),
                "category" => {
                    query.category = (!value.is_empty()).then(|| CategoryId::new(value))
                }
                "condition" => query.condition = Condition::parse(&value),
                "hall" => query.hall = (!value.is_empty()).then_some(value),
                "price_min" => query.price_min = value.parse().ok(),
                "price_max" => query.price_max = value.parse().ok(),
                _ => {}
            }
        }
        query
    }

    /// Serialize to a URL query string, omitting empty and default fields.
    /// The empty query serializes to the empty string.
    pub fn to_url_params(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if !self.text.is_empty() {
            pairs.push(("q", self.text.clone()));
        }
        if let Some(t) = self.offer_type {
            pairs.push(("type", t.as_str().to_string()));
        }
        if self.sort_by != SortBy::default() {
            pairs.push(("sort", self.sort_by.as_str().to_string()));
        }
        if let Some(c) = &self.category {
            pairs.push(("category", c.as_str().to_string()));
        }
        if let Some(c) = self.condition {
            pairs.push(("condition", c.as_str().to_string()));
        }
        if let Some(h) = &self.hall {
            if !h.is_empty() {
                pairs.push(("hall", h.clone()));
            }
        }
        if let Some(p) = self.price_min {
            pairs.push(("price_min", p.to_string()));
        }
        if let Some(p) = self.price_max {
            pairs.push(("price_max", p.to_string()));
        }
        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, encode_component(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Number of active discrete filters (what the filter-sheet badge shows).
    /// Text and sort don't count; a price range counts once.
    pub fn active_filter_count(&self) -> usize {
        let mut count = 0;
        if self.category.is_some() {
            count += 1;
        }
        if self.condition.is_some() {
            count += 1;
        }
        if self.hall.is_some() {
            count += 1;
        }
        if self.price_min.is_some() || self.price_max.is_some() {
            count += 1;
        }
        count
    }

    /// Drop the discrete filters, keeping text and sort.
    pub fn clear_filters(&mut self) {
        self.category = None;
        self.condition = None;
        self.hall = None;
        self.price_min = None;
        self.price_max = None;
    }

    /// Wire arguments for the search procedure, for the page at `offset`.
    pub fn to_params(&self, offset: u32) -> SearchParams {
        SearchParams {
            search_text: self.text.clone(),
            filter_category_id: self.category.clone(),
            filter_offer_type: self.offer_type,
            filter_condition: self.condition,
            filter_hall: self.hall.clone(),
            filter_price_min: self.price_min,
            filter_price_max: self.price_max,
            sort_by: self.sort_by,
            page_limit: PAGE_LIMIT,
            page_offset: offset,
        }
    }
}

/// Percent-encode a query-string value.
pub fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '~' => out.push(c),
            ' ' => out.push('+'),
            _ => {
                for byte in c.to_string().as_bytes() {
                    out.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    out
}

/// Percent-decode a query-string value. Invalid escapes pass through.
pub fn decode_component(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut iter = s.bytes();
    while let Some(b) = iter.next() {
        match b {
            b'%' => {
                let hi = iter.next();
                let lo = iter.next();
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        let hex = [hi, lo];
                        match u8::from_str_radix(std::str::from_utf8(&hex).unwrap_or(""), 16) {
                            Ok(byte) => bytes.push(byte),
                            Err(_) => {
                                bytes.push(b'%');
                                bytes.extend_from_slice(&hex);
                            }
                        }
                    }
                    _ => bytes.push(b'%'),
                }
            }
            b'+' => bytes.push(b' '),
            _ => bytes.push(b),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
