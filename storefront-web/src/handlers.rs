//! Page handlers
//!
//! Placeholder pages that sit behind the edge gate. Anything a handler here
//! renders for `/profile` or `/dashboard` has already passed the gate.

use crate::gate::GateSession;
use crate::templates::{ErrorTemplate, PageTemplate};
use crate::{AppState, WebResult};
use askama::Template;
use axum::{
    extract::{Extension, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Json, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::json;
use storefront_core::{ACCESS_TOKEN_COOKIE, LOGIN_PATH, REFRESH_TOKEN_COOKIE};
use storefront_session::access::DASHBOARD_ROOT;
use storefront_session::{account_menu, sidebar_links, signed_in_menu, RouteAccessTable};

fn render<T: Template>(template: &T) -> WebResult<Html<String>> {
    Ok(Html(template.render()?))
}

/// Health check
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn home(State(state): State<AppState>) -> WebResult<Html<String>> {
    render(
        &PageTemplate::new(&state.config.site_name, "Home")
            .message("Welcome to the store.")
            .menu(account_menu(None)),
    )
}

pub async fn login(State(state): State<AppState>) -> WebResult<Html<String>> {
    render(&PageTemplate::new(&state.config.site_name, "Login").menu(account_menu(None)))
}

pub async fn register(State(state): State<AppState>) -> WebResult<Html<String>> {
    render(&PageTemplate::new(&state.config.site_name, "Register").menu(account_menu(None)))
}

/// Drop both token cookies and head to the login page
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar
        .remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_TOKEN_COOKIE).path("/"));
    (jar, Redirect::temporary(LOGIN_PATH))
}

pub async fn profile(
    State(state): State<AppState>,
    session: Option<Extension<GateSession>>,
) -> WebResult<Html<String>> {
    // The gate only looks up the profile on the dashboard
    let menu = match session {
        Some(Extension(GateSession { user: Some(user), .. })) => account_menu(Some(&user)),
        Some(_) => signed_in_menu(None),
        None => account_menu(None),
    };
    render(
        &PageTemplate::new(&state.config.site_name, "Profile")
            .message("You are signed in.")
            .menu(menu),
    )
}

/// Dashboard root and every section below it
pub async fn dashboard(
    State(state): State<AppState>,
    uri: Uri,
    session: Option<Extension<GateSession>>,
) -> WebResult<Html<String>> {
    let user = session.and_then(|Extension(s)| s.user);
    let heading = match RouteAccessTable::section_of(uri.path()) {
        Some(section) if section != DASHBOARD_ROOT => format!("Dashboard: {}", section),
        _ => "Dashboard".to_string(),
    };
    let message = user
        .as_ref()
        .map(|u| format!("Signed in as {} ({})", u.display_name(), u.role.label()))
        .unwrap_or_default();

    render(
        &PageTemplate::new(&state.config.site_name, &heading)
            .message(message)
            .menu(account_menu(user.as_ref()))
            .sidebar(sidebar_links(&state.routes, user.as_ref())),
    )
}

pub async fn forbidden(State(state): State<AppState>) -> WebResult<Response> {
    let page = render(&ErrorTemplate::new(
        &state.config.site_name,
        403,
        "You do not have permission to view this page.",
    ))?;
    Ok((StatusCode::FORBIDDEN, page).into_response())
}

pub async fn not_found(State(state): State<AppState>) -> WebResult<Response> {
    let page = render(&ErrorTemplate::new(
        &state.config.site_name,
        404,
        "The page you are looking for does not exist.",
    ))?;
    Ok((StatusCode::NOT_FOUND, page).into_response())
}
