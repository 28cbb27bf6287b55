//! Newtype IDs for backend-owned entities.
//!
//! Every identifier in this system is minted by the backend; the client only
//! carries them around, so there is deliberately no `generate()` here. The
//! newtypes keep a `ListingId` from being passed where a `UserId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate opaque string ID newtypes.
macro_rules! backend_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an ID received from the backend.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

backend_id!(
    /// Identifies a listing (a product or service offer).
    ListingId
);
backend_id!(
    /// Identifies a user account. Sellers are users too.
    UserId
);
backend_id!(
    /// Identifies a listing category.
    CategoryId
);
