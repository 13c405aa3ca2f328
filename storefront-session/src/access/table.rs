//! Route sensitivity table
//!
//! One declarative mapping from dashboard sections to the roles allowed to
//! open them. The edge gate, the client-side page guard and the sidebar
//! filter all read from the same table.

use serde::{Deserialize, Serialize};
use storefront_core::Role;

/// Name of the section that stands for the dashboard root (`/dashboard`)
pub const DASHBOARD_ROOT: &str = "dashboard";

/// Allowed roles for one dashboard section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRule {
    /// Path segment after `/dashboard/`, or `dashboard` for the root
    pub section: String,
    /// Roles permitted to open the section
    pub allowed_roles: Vec<Role>,
    /// Sidebar label; `None` keeps the section out of the sidebar
    pub label: Option<String>,
}

impl RouteRule {
    pub fn new(section: &str, allowed_roles: &[Role]) -> Self {
        Self {
            section: section.to_string(),
            allowed_roles: allowed_roles.to_vec(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed_roles.contains(&role)
    }

    /// Link target for the sidebar
    pub fn href(&self) -> String {
        if self.section == DASHBOARD_ROOT {
            "/dashboard".to_string()
        } else {
            format!("/dashboard/{}", self.section)
        }
    }
}

/// Outcome of checking a path against the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Not a dashboard path; the table has no opinion
    Public,
    Granted,
    Denied,
}

/// Static mapping from dashboard sections to allowed roles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAccessTable {
    rules: Vec<RouteRule>,
}

impl Default for RouteAccessTable {
    fn default() -> Self {
        use Role::{Admin, Seller};

        Self::new(vec![
            RouteRule::new(DASHBOARD_ROOT, &[Admin, Seller]),
            RouteRule::new("users", &[Admin]).with_label("users"),
            RouteRule::new("categories", &[Admin, Seller]).with_label("categories"),
            RouteRule::new("products", &[Admin, Seller]).with_label("products"),
            RouteRule::new("orders", &[Admin, Seller]).with_label("orders"),
            RouteRule::new("settings", &[Admin]).with_label("settings"),
        ])
    }
}

impl RouteAccessTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Whether the path belongs to the dashboard tree
    pub fn is_protected(path: &str) -> bool {
        Self::section_of(path).is_some()
    }

    /// Section key for a dashboard path.
    ///
    /// `/dashboard` and `/dashboard/` map to the root key, `/dashboard/users/3/edit`
    /// maps to `users`. Anything outside `/dashboard` yields `None`.
    pub fn section_of(path: &str) -> Option<&str> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        match segments.next() {
            Some(DASHBOARD_ROOT) => Some(segments.next().unwrap_or(DASHBOARD_ROOT)),
            _ => None,
        }
    }

    /// Rule governing a dashboard path, if the section is known
    pub fn rule_for(&self, path: &str) -> Option<&RouteRule> {
        let section = Self::section_of(path)?;
        self.rules.iter().find(|rule| rule.section == section)
    }

    /// Check a role against the path.
    ///
    /// Unknown sections under `/dashboard` are denied.
    pub fn check(&self, path: &str, role: Role) -> RouteAccess {
        if !Self::is_protected(path) {
            return RouteAccess::Public;
        }

        match self.rule_for(path) {
            Some(rule) if rule.allows(role) => RouteAccess::Granted,
            _ => RouteAccess::Denied,
        }
    }

    /// Sidebar entries visible to a role, in table order
    pub fn sidebar_for(&self, role: Role) -> Vec<&RouteRule> {
        self.rules
            .iter()
            .filter(|rule| rule.label.is_some() && rule.allows(role))
            .collect()
    }
}
