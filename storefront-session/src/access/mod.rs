//! Role-based access to storefront routes
//!
//! The route table is the only place that knows which role may open which
//! dashboard section. Guards and menus ask it instead of repeating the rules.

pub mod guard;
pub mod navigation;
pub mod table;

pub use guard::{GuardVerdict, PageGuard};
pub use navigation::{account_menu, sidebar_links, signed_in_menu, NavLink};
pub use table::{RouteAccess, RouteAccessTable, RouteRule, DASHBOARD_ROOT};
