//! The viewer capability object.
//!
//! Carries whoever is looking at the page. Constructed once at the request
//! boundary and handed explicitly to the feed session and favorite controller
//! instead of living in ambient state, so everything that needs to know "who
//! is asking" says so in its signature.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Profile of a signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub hall_of_residence: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Who is viewing: a signed-in user or an anonymous visitor.
///
/// Session issuance happens outside this system; by the time a `Viewer`
/// exists, authentication has already been decided.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    user: Option<UserProfile>,
}

impl Viewer {
    /// An anonymous visitor.
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    /// A signed-in user.
    pub fn signed_in(profile: UserProfile) -> Self {
        Self {
            user: Some(profile),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|u| &u.id)
    }

    /// Whether this viewer owns the given seller's content.
    pub fn owns(&self, seller: &UserId) -> bool {
        self.user_id() == Some(seller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> UserProfile {
        UserProfile {
            id: UserId::new(id),
            name: "Tolu".to_string(),
            hall_of_residence: Some("mellanby".to_string()),
            course: None,
            avatar: None,
        }
    }

    #[test]
    fn test_anonymous_viewer() {
        let v = Viewer::anonymous();
        assert!(!v.is_authenticated());
        assert!(v.user_id().is_none());
        assert!(!v.owns(&UserId::new("usr-1")));
    }

    #[test]
    fn test_signed_in_viewer_owns_own_listings() {
        let v = Viewer::signed_in(profile("usr-1"));
        assert!(v.is_authenticated());
        assert!(v.owns(&UserId::new("usr-1")));
        assert!(!v.owns(&UserId::new("usr-2")));
    }
}
