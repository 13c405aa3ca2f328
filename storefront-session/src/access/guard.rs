//! Client-side page guard
//!
//! Second line of defence behind the edge gate: decides whether a page may
//! render for the current session state.

use super::table::{RouteAccess, RouteAccessTable};
use crate::provider::SessionState;
use storefront_core::FORBIDDEN_PATH;

/// What the page should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVerdict {
    /// Session still loading; show a spinner
    Pending,
    Allow,
    /// Redirect to the forbidden page
    Forbidden,
}

impl GuardVerdict {
    /// Redirect target, if any
    pub fn redirect(self) -> Option<&'static str> {
        match self {
            GuardVerdict::Forbidden => Some(FORBIDDEN_PATH),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageGuard {
    table: RouteAccessTable,
}

impl PageGuard {
    pub fn new(table: RouteAccessTable) -> Self {
        Self { table }
    }

    pub fn check(&self, path: &str, state: &SessionState) -> GuardVerdict {
        if state.is_pending() {
            return GuardVerdict::Pending;
        }

        if !RouteAccessTable::is_protected(path) {
            return GuardVerdict::Allow;
        }

        match state.user() {
            Some(user) if self.table.check(path, user.role) == RouteAccess::Granted => {
                GuardVerdict::Allow
            }
            _ => GuardVerdict::Forbidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::{Role, UserProfile};

    fn signed_in(role: Role) -> SessionState {
        SessionState::Authenticated(UserProfile {
            id: "u".to_string(),
            username: None,
            email: None,
            image: None,
            role,
        })
    }

    #[test]
    fn test_pending_while_loading() {
        let guard = PageGuard::default();
        assert_eq!(
            guard.check("/dashboard/users", &SessionState::Loading),
            GuardVerdict::Pending
        );
    }

    #[test]
    fn test_dashboard_requires_allowed_role() {
        let guard = PageGuard::default();

        assert_eq!(
            guard.check("/dashboard/users", &signed_in(Role::Admin)),
            GuardVerdict::Allow
        );
        let verdict = guard.check("/dashboard/users", &signed_in(Role::Seller));
        assert_eq!(verdict, GuardVerdict::Forbidden);
        assert_eq!(verdict.redirect(), Some("/403"));
        assert_eq!(
            guard.check("/dashboard", &SessionState::Anonymous),
            GuardVerdict::Forbidden
        );
    }

    #[test]
    fn test_public_pages_allowed() {
        let guard = PageGuard::default();
        assert_eq!(
            guard.check("/products/1", &SessionState::Anonymous),
            GuardVerdict::Allow
        );
    }
}
