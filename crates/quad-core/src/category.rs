//! Listing categories.
//!
//! Reference data fetched once per page view to populate the filter sheet.
//! Failure to load categories is non-critical: the filter just renders empty.

use serde::{Deserialize, Serialize};

use crate::ids::CategoryId;

/// A listing category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slug: None,
        }
    }
}

/// Find a category's display name by ID, e.g. for an active-filter pill.
pub fn category_name<'a>(categories: &'a [Category], id: &CategoryId) -> Option<&'a str> {
    categories
        .iter()
        .find(|c| &c.id == id)
        .map(|c| c.name.as_str())
}
