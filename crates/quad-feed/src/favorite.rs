//! Optimistic favorite toggling.
//!
//! The displayed state flips immediately on click; the persist call runs
//! after a quiet period so rapid toggles collapse to a single network
//! operation. Each click (re)arms the window carrying the pre-toggle value,
//! so the operation that eventually fires is the right insert-or-delete for
//! the last click — even when the user double-clicks inside the window.

use std::time::{Duration, Instant};

use quad_core::ids::ListingId;
use quad_core::viewer::Viewer;
use quad_rpc::RpcError;

use crate::debounce::Debounce;

/// Quiet period between the last click and the persist call.
pub const PERSIST_DEBOUNCE: Duration = Duration::from_millis(500);

/// Membership as known so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteStatus {
    /// The initial membership read hasn't resolved yet.
    Unknown,
    /// Last backend-confirmed value.
    Settled(bool),
}

/// What the UI should do after a toggle attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum ToggleOutcome {
    /// Display flipped to the contained value; a persist is scheduled.
    Toggled(bool),
    /// Viewer is not signed in: prompt for sign-in, change nothing.
    SignInRequired,
    /// The initial membership read hasn't resolved; ignore the click.
    NotReady,
}

/// The persist operation due once the window closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOp {
    /// Insert the membership row.
    Insert,
    /// Delete the membership row.
    Remove,
}

/// Per-(viewer, listing) optimistic toggle state machine.
#[derive(Debug, Clone)]
pub struct FavoriteToggle {
    listing: ListingId,
    status: FavoriteStatus,
    /// Client-predicted value currently displayed.
    shown: bool,
    /// Pending window; payload is the pre-toggle value at (re)arm time.
    debounce: Debounce<bool>,
    /// Pre-toggle value of the persist currently in flight, kept for revert.
    in_flight: Option<bool>,
    error: Option<String>,
}

impl FavoriteToggle {
    pub fn new(listing: ListingId) -> Self {
        Self {
            listing,
            status: FavoriteStatus::Unknown,
            shown: false,
            debounce: Debounce::new(PERSIST_DEBOUNCE),
            in_flight: None,
            error: None,
        }
    }

    pub fn listing(&self) -> &ListingId {
        &self.listing
    }

    /// Resolve the initial membership read. Later resolutions are ignored so
    /// a slow probe can't clobber a toggle the user already made.
    pub fn resolve_status(&mut self, favorited: bool) {
        if self.status == FavoriteStatus::Unknown {
            self.status = FavoriteStatus::Settled(favorited);
            self.shown = favorited;
        }
    }

    /// Handle a click on the favorite control.
    pub fn toggle(&mut self, viewer: &Viewer, now: Instant) -> ToggleOutcome {
        if !viewer.is_authenticated() {
            return ToggleOutcome::SignInRequired;
        }
        if self.status == FavoriteStatus::Unknown {
            return ToggleOutcome::NotReady;
        }
        let pre = self.shown;
        self.shown = !pre;
        self.error = None;
        self.debounce.arm(pre, now);
        ToggleOutcome::Toggled(self.shown)
    }

    /// Timer tick. Emits the persist op once the window closes; the caller
    /// runs it and reports back via [`on_persist`].
    ///
    /// [`on_persist`]: FavoriteToggle::on_persist
    pub fn tick(&mut self, now: Instant) -> Option<PersistOp> {
        let pre = self.debounce.fire_due(now)?;
        self.in_flight = Some(pre);
        Some(if pre {
            PersistOp::Remove
        } else {
            PersistOp::Insert
        })
    }

    /// Reconcile the persist outcome.
    ///
    /// A duplicate-membership conflict means the backend already holds the
    /// row — success, no revert. Any other failure reverts the display to
    /// the pre-toggle value and records a transient error.
    pub fn on_persist(&mut self, result: Result<(), RpcError>) {
        let Some(pre) = self.in_flight.take() else {
            return;
        };
        match result {
            Ok(()) => {
                self.status = FavoriteStatus::Settled(!pre);
                self.error = None;
            }
            Err(e) if e.is_conflict() => {
                // Insert hit an existing row: membership already holds.
                self.status = FavoriteStatus::Settled(true);
                self.error = None;
            }
            Err(e) => {
                self.shown = pre;
                self.status = FavoriteStatus::Settled(pre);
                self.debounce.cancel();
                self.error = Some(e.to_string());
            }
        }
    }

    /// Client-predicted value to render.
    pub fn is_favorited(&self) -> bool {
        self.shown
    }

    pub fn status(&self) -> FavoriteStatus {
        self.status
    }

    /// Whether a persist is scheduled or in flight.
    pub fn persist_pending(&self) -> bool {
        self.debounce.is_armed() || self.in_flight.is_some()
    }

    /// Transient error from the last failed persist, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Next wake-up the embedder should schedule for [`tick`], if any.
    ///
    /// [`tick`]: FavoriteToggle::tick
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quad_core::ids::UserId;
    use quad_core::viewer::UserProfile;

    fn signed_in() -> Viewer {
        Viewer::signed_in(UserProfile {
            id: UserId::new("usr-1"),
            name: "Ada".to_string(),
            hall_of_residence: None,
            course: None,
            avatar: None,
        })
    }

    fn resolved(favorited: bool) -> FavoriteToggle {
        let mut fav = FavoriteToggle::new(ListingId::new("lst-1"));
        fav.resolve_status(favorited);
        fav
    }

    #[test]
    fn test_unauthenticated_click_prompts_sign_in() {
        let mut fav = resolved(false);
        let outcome = fav.toggle(&Viewer::anonymous(), Instant::now());
        assert_eq!(outcome, ToggleOutcome::SignInRequired);
        assert!(!fav.is_favorited());
        assert!(!fav.persist_pending());
    }

    #[test]
    fn test_click_before_status_resolves_is_ignored() {
        let mut fav = FavoriteToggle::new(ListingId::new("lst-1"));
        let outcome = fav.toggle(&signed_in(), Instant::now());
        assert_eq!(outcome, ToggleOutcome::NotReady);
        assert!(!fav.persist_pending());
    }

    #[test]
    fn test_single_toggle_persists_insert() {
        let mut fav = resolved(false);
        let t0 = Instant::now();
        assert_eq!(
            fav.toggle(&signed_in(), t0),
            ToggleOutcome::Toggled(true)
        );
        assert!(fav.is_favorited());
        assert_eq!(fav.tick(t0 + Duration::from_millis(400)), None);
        assert_eq!(
            fav.tick(t0 + PERSIST_DEBOUNCE),
            Some(PersistOp::Insert)
        );
        fav.on_persist(Ok(()));
        assert_eq!(fav.status(), FavoriteStatus::Settled(true));
        assert!(!fav.persist_pending());
    }

    #[test]
    fn test_double_toggle_collapses_to_one_remove() {
        // favorite → unfavorite inside the window: one network call, and it
        // carries the pre-toggle state of the last click.
        let mut fav = resolved(false);
        let t0 = Instant::now();
        let _ = fav.toggle(&signed_in(), t0);
        let _ = fav.toggle(&signed_in(), t0 + Duration::from_millis(100));
        assert!(!fav.is_favorited());

        // The first window deadline passes silently (re-armed).
        assert_eq!(fav.tick(t0 + PERSIST_DEBOUNCE), None);
        let op = fav.tick(t0 + Duration::from_millis(100) + PERSIST_DEBOUNCE);
        assert_eq!(op, Some(PersistOp::Remove));
        // Exactly one op.
        assert_eq!(fav.tick(t0 + Duration::from_secs(10)), None);
        fav.on_persist(Ok(()));
        assert_eq!(fav.status(), FavoriteStatus::Settled(false));
    }

    #[test]
    fn test_conflict_counts_as_success() {
        let mut fav = resolved(false);
        let t0 = Instant::now();
        let _ = fav.toggle(&signed_in(), t0);
        assert_eq!(fav.tick(t0 + PERSIST_DEBOUNCE), Some(PersistOp::Insert));
        fav.on_persist(Err(RpcError::Conflict));
        assert!(fav.is_favorited());
        assert_eq!(fav.status(), FavoriteStatus::Settled(true));
        assert!(fav.error().is_none());
    }

    #[test]
    fn test_failure_reverts_to_pre_toggle_value() {
        let mut fav = resolved(true);
        let t0 = Instant::now();
        let _ = fav.toggle(&signed_in(), t0);
        assert!(!fav.is_favorited());
        assert_eq!(fav.tick(t0 + PERSIST_DEBOUNCE), Some(PersistOp::Remove));
        fav.on_persist(Err(RpcError::Connection("reset".to_string())));
        assert!(fav.is_favorited());
        assert_eq!(fav.status(), FavoriteStatus::Settled(true));
        assert!(fav.error().is_some());
    }

    #[test]
    fn test_late_status_probe_does_not_clobber_toggle() {
        let mut fav = resolved(false);
        let t0 = Instant::now();
        let _ = fav.toggle(&signed_in(), t0);
        // A duplicate resolution arriving late changes nothing.
        fav.resolve_status(false);
        assert!(fav.is_favorited());
    }
}
