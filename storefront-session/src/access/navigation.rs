//! Navigation menus derived from session state

use super::table::RouteAccessTable;
use serde::Serialize;
use storefront_core::{Role, UserProfile, DASHBOARD_PATH, LOGIN_PATH, LOGOUT_PATH, PROFILE_PATH, REGISTER_PATH};

/// A single menu entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: String,
    pub href: String,
}

impl NavLink {
    fn new(label: &str, href: &str) -> Self {
        Self {
            label: label.to_string(),
            href: href.to_string(),
        }
    }
}

/// Dropdown shown in the storefront navbar
pub fn account_menu(user: Option<&UserProfile>) -> Vec<NavLink> {
    match user {
        Some(user) => signed_in_menu(Some(user.role)),
        None => vec![
            NavLink::new("Login", LOGIN_PATH),
            NavLink::new("Register", REGISTER_PATH),
        ],
    }
}

/// Menu for a signed-in user. Without a known role the dashboard entry is left out.
pub fn signed_in_menu(role: Option<Role>) -> Vec<NavLink> {
    let mut items = Vec::with_capacity(5);
    if role.is_some_and(Role::is_staff) {
        items.push(NavLink::new("Dashboard", DASHBOARD_PATH));
    }
    items.extend([
        NavLink::new("Cart", "/cart"),
        NavLink::new("Orders", "/orders"),
        NavLink::new("Profile", PROFILE_PATH),
        NavLink::new("Logout", LOGOUT_PATH),
    ]);
    items
}

/// Dashboard sidebar links the user may follow
pub fn sidebar_links(table: &RouteAccessTable, user: Option<&UserProfile>) -> Vec<NavLink> {
    let Some(user) = user else {
        return Vec::new();
    };

    table
        .sidebar_for(user.role)
        .into_iter()
        .filter_map(|rule| {
            rule.label.as_ref().map(|label| NavLink {
                label: label.clone(),
                href: rule.href(),
            })
        })
        .collect()
}
