//! Template system for server-side rendering
//!
//! Pages are placeholders: a title, the account menu and, on the dashboard,
//! the role-filtered sidebar.

use askama::Template;
use storefront_session::NavLink;

/// Generic page template
#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    pub title: String,
    pub site_name: String,
    pub heading: String,
    pub message: String,
    pub menu: Vec<NavLink>,
    pub sidebar: Vec<NavLink>,
}

impl PageTemplate {
    pub fn new(site_name: &str, heading: &str) -> Self {
        Self {
            title: format!("{} - {}", heading, site_name),
            site_name: site_name.to_string(),
            heading: heading.to_string(),
            message: String::new(),
            menu: Vec::new(),
            sidebar: Vec::new(),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn menu(mut self, menu: Vec<NavLink>) -> Self {
        self.menu = menu;
        self
    }

    pub fn sidebar(mut self, sidebar: Vec<NavLink>) -> Self {
        self.sidebar = sidebar;
        self
    }
}

/// Error page template
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: String,
    pub error_code: u16,
    pub error_message: String,
}

impl ErrorTemplate {
    pub fn new(site_name: &str, error_code: u16, error_message: &str) -> Self {
        Self {
            title: format!("Error {} - {}", error_code, site_name),
            error_code,
            error_message: error_message.to_string(),
        }
    }
}
