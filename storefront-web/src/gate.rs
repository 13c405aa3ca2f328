//! Edge session gate
//!
//! Runs in front of every page. Only a handful of path groups are gated;
//! everything else passes straight through.
//!
//! | Path group              | Rule                                                      |
//! |-------------------------|-----------------------------------------------------------|
//! | `/login`, `/register`   | any token cookie present: redirect to `/`                 |
//! | `/logout`               | no token cookie present: redirect to `/`                  |
//! | `/profile/**`           | access token required, refreshed if only refresh is held |
//! | `/dashboard/**`         | as profile, plus the caller's role must be allowed        |
//!
//! Failures while refreshing or fetching the profile fail closed: the refresh
//! cookie is cleared and the caller is sent to `/login`. A refresh cookie the
//! backend rotates during an edge refresh is passed on to the browser.

use crate::backend::EdgeRefresh;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use storefront_core::{
    StorefrontError, UserProfile, ACCESS_TOKEN_COOKIE, DASHBOARD_PATH, FORBIDDEN_PATH, HOME_PATH,
    LOGIN_PATH, LOGOUT_PATH, PROFILE_PATH, REFRESH_TOKEN_COOKIE, REGISTER_PATH,
};
use storefront_session::{CookiePolicy, RouteAccess};
use tracing::{debug, info, warn};

/// Which gate rule applies to a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathGroup {
    /// Login and register
    Auth,
    Logout,
    Profile,
    Dashboard,
    /// Not gated
    Open,
}

impl PathGroup {
    pub fn of(path: &str) -> Self {
        if path == LOGIN_PATH || path == REGISTER_PATH {
            PathGroup::Auth
        } else if path == LOGOUT_PATH {
            PathGroup::Logout
        } else if is_within(path, PROFILE_PATH) {
            PathGroup::Profile
        } else if is_within(path, DASHBOARD_PATH) {
            PathGroup::Dashboard
        } else {
            PathGroup::Open
        }
    }
}

/// `path` is `root` itself or somewhere below it
fn is_within(path: &str, root: &str) -> bool {
    path.strip_prefix(root)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// What the gate learned about the caller, available to page handlers
#[derive(Debug, Clone)]
pub struct GateSession {
    pub access_token: String,
    /// Only fetched for dashboard paths
    pub user: Option<UserProfile>,
}

/// Reasons the gate turns a protected request away
#[derive(Debug)]
enum GateRejection {
    /// Neither cookie usable
    NoSession,
    /// Refresh or profile lookup failed
    Backend(StorefrontError),
}

/// The edge gate middleware
pub async fn edge_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let access_token = non_empty(&jar, ACCESS_TOKEN_COOKIE);
    let refresh_token = non_empty(&jar, REFRESH_TOKEN_COOKIE);

    let group = PathGroup::of(&path);
    match group {
        PathGroup::Open => next.run(request).await,

        PathGroup::Auth => {
            if access_token.is_some() || refresh_token.is_some() {
                debug!(path = %path, "Signed-in visitor on auth page");
                return Redirect::temporary(HOME_PATH).into_response();
            }
            next.run(request).await
        }

        PathGroup::Logout => {
            if access_token.is_none() && refresh_token.is_none() {
                return Redirect::temporary(HOME_PATH).into_response();
            }
            next.run(request).await
        }

        PathGroup::Profile | PathGroup::Dashboard => {
            let (token, refreshed) =
                match ensure_access_token(&state, access_token, refresh_token).await {
                    Ok(result) => result,
                    Err(rejection) => return send_to_login(jar, &path, rejection),
                };

            let jar = match refreshed {
                Some(EdgeRefresh { refresh_cookie, .. }) => {
                    let jar = jar.add(access_token_cookie(&state.config.cookie_policy, &token));
                    match refresh_cookie {
                        Some(rotated) => jar.add(rotated),
                        None => jar,
                    }
                }
                None => jar,
            };

            let mut session = GateSession {
                access_token: token,
                user: None,
            };

            if group == PathGroup::Dashboard {
                let user = match state.backend.fetch_profile(&session.access_token).await {
                    Ok(user) => user,
                    Err(e) => return send_to_login(jar, &path, GateRejection::Backend(e)),
                };

                if state.routes.check(&path, user.role) != RouteAccess::Granted {
                    info!(path = %path, role = %user.role, "Role not allowed on dashboard path");
                    return (jar, Redirect::temporary(FORBIDDEN_PATH)).into_response();
                }
                session.user = Some(user);
            }

            request.extensions_mut().insert(session);
            (jar, next.run(request).await).into_response()
        }
    }
}

fn non_empty(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Access token to use for this request, plus the refresh that minted it
async fn ensure_access_token(
    state: &AppState,
    access_token: Option<String>,
    refresh_token: Option<String>,
) -> Result<(String, Option<EdgeRefresh>), GateRejection> {
    if let Some(token) = access_token {
        return Ok((token, None));
    }

    let Some(refresh_token) = refresh_token else {
        return Err(GateRejection::NoSession);
    };

    debug!("Access token missing, refreshing at the edge");
    let refreshed = state
        .backend
        .refresh(&refresh_token)
        .await
        .map_err(GateRejection::Backend)?;
    Ok((refreshed.access_token.clone(), Some(refreshed)))
}

fn send_to_login(jar: CookieJar, path: &str, rejection: GateRejection) -> Response {
    match &rejection {
        GateRejection::NoSession => debug!(path = %path, "No session cookies"),
        GateRejection::Backend(e) => warn!(path = %path, error = %e, "Session check failed"),
    }

    let jar = jar.remove(Cookie::build(REFRESH_TOKEN_COOKIE).path("/"));
    (jar, Redirect::temporary(LOGIN_PATH)).into_response()
}

/// Same attributes the session client uses for the cookie
fn access_token_cookie(policy: &CookiePolicy, token: &str) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, token.to_string()))
        .path("/")
        .max_age(cookie::time::Duration::minutes(
            policy.access_token_ttl.num_minutes(),
        ))
        .same_site(SameSite::Strict)
        .secure(policy.secure)
        .build()
}
