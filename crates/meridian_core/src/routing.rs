//! crates/meridian_core/src/routing.rs
//!
//! The status router: maps (session presence, profile status, current page)
//! to the single action the front end must take. This consolidates the
//! per-page guard logic into one canonical decision function.

use crate::domain::ProfileStatus;

/// An explicit route identifier, resolved once from the last path segment
/// instead of matching on raw page strings throughout the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Signup,
    Onboarding,
    Dashboard,
    Support,
}

impl Page {
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "login" => Some(Page::Login),
            "signup" => Some(Page::Signup),
            "onboarding" => Some(Page::Onboarding),
            "dashboard" => Some(Page::Dashboard),
            "support" => Some(Page::Support),
            _ => None,
        }
    }

    pub fn as_segment(&self) -> &'static str {
        match self {
            Page::Login => "login",
            Page::Signup => "signup",
            Page::Onboarding => "onboarding",
            Page::Dashboard => "dashboard",
            Page::Support => "support",
        }
    }
}

/// What the caller must do with the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    /// The page is allowed as-is.
    Stay,
    /// Navigate to the given page instead.
    Redirect(Page),
    /// Stay on the onboarding page, but show the "pending" section and hide
    /// the application form.
    RevealPending,
}

/// Resolves the route action for a page load.
///
/// `status` is `None` when there is no authenticated session; in that case
/// the profile is never consulted and the answer is always a redirect to the
/// login page. The remaining rules form an ordered if/else chain - the first
/// matching rule wins.
pub fn resolve(status: Option<ProfileStatus>, page: Page) -> RouteAction {
    let Some(status) = status else {
        return RouteAction::Redirect(Page::Login);
    };

    if status == ProfileStatus::Approved && page != Page::Dashboard && page != Page::Support {
        RouteAction::Redirect(Page::Dashboard)
    } else if status == ProfileStatus::New && page != Page::Onboarding {
        RouteAction::Redirect(Page::Onboarding)
    } else if status == ProfileStatus::PendingApproval && page == Page::Onboarding {
        RouteAction::RevealPending
    } else if status == ProfileStatus::PendingApproval && page != Page::Onboarding {
        RouteAction::Redirect(Page::Onboarding)
    } else if status != ProfileStatus::Approved && page == Page::Support {
        // Support is reserved for approved users.
        RouteAction::Redirect(Page::Onboarding)
    } else {
        RouteAction::Stay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProfileStatus::*;

    const ALL_PAGES: [Page; 5] = [
        Page::Login,
        Page::Signup,
        Page::Onboarding,
        Page::Dashboard,
        Page::Support,
    ];

    #[test]
    fn no_session_always_redirects_to_login() {
        for page in ALL_PAGES {
            assert_eq!(resolve(None, page), RouteAction::Redirect(Page::Login));
        }
    }

    #[test]
    fn approved_users_land_on_dashboard() {
        for page in [Page::Login, Page::Signup, Page::Onboarding] {
            assert_eq!(
                resolve(Some(Approved), page),
                RouteAction::Redirect(Page::Dashboard)
            );
        }
        assert_eq!(resolve(Some(Approved), Page::Dashboard), RouteAction::Stay);
        assert_eq!(resolve(Some(Approved), Page::Support), RouteAction::Stay);
    }

    #[test]
    fn new_users_are_held_on_onboarding() {
        for page in [Page::Login, Page::Signup, Page::Dashboard, Page::Support] {
            assert_eq!(
                resolve(Some(New), page),
                RouteAction::Redirect(Page::Onboarding)
            );
        }
        assert_eq!(resolve(Some(New), Page::Onboarding), RouteAction::Stay);
    }

    #[test]
    fn pending_users_see_the_pending_section() {
        assert_eq!(
            resolve(Some(PendingApproval), Page::Onboarding),
            RouteAction::RevealPending
        );
        for page in [Page::Login, Page::Signup, Page::Dashboard, Page::Support] {
            assert_eq!(
                resolve(Some(PendingApproval), page),
                RouteAction::Redirect(Page::Onboarding)
            );
        }
    }

    #[test]
    fn new_user_on_dashboard_goes_to_onboarding() {
        assert_eq!(
            resolve(Some(New), Page::Dashboard),
            RouteAction::Redirect(Page::Onboarding)
        );
    }

    #[test]
    fn support_is_approved_only() {
        assert_eq!(resolve(Some(Approved), Page::Support), RouteAction::Stay);
        assert_eq!(
            resolve(Some(New), Page::Support),
            RouteAction::Redirect(Page::Onboarding)
        );
        assert_eq!(
            resolve(Some(PendingApproval), Page::Support),
            RouteAction::Redirect(Page::Onboarding)
        );
    }

    #[test]
    fn page_segments_round_trip() {
        for page in ALL_PAGES {
            assert_eq!(Page::from_segment(page.as_segment()), Some(page));
        }
        assert_eq!(Page::from_segment("index.html"), None);
    }
}
