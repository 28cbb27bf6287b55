//! Domain types for the Quadmart campus marketplace client.
//!
//! This crate holds the vocabulary shared by the RPC layer, the feed engine
//! and the workloads:
//!
//! - **IDs**: opaque backend-minted identifiers (`ListingId`, `UserId`, ...)
//! - **Listings**: `ListingSummary`, seller details, offer type / condition /
//!   status / sort enums
//! - **Viewer**: the capability object identifying who is looking
//! - **Errors**: the domain error taxonomy
//! - **Logging**: structured JSON-line logger (stderr; Spin captures it)

pub mod category;
pub mod error;
pub mod ids;
pub mod listing;
pub mod log;
pub mod viewer;

pub use error::MarketError;
pub use ids::{CategoryId, ListingId, UserId};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::category::{category_name, Category};
    pub use crate::error::MarketError;
    pub use crate::ids::{CategoryId, ListingId, UserId};
    pub use crate::listing::{
        Condition, ListingStatus, ListingSummary, OfferType, SellerSummary, SortBy,
    };
    pub use crate::log::{LogLevel, Logger};
    pub use crate::viewer::{UserProfile, Viewer};
}
