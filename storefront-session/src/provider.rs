//! Client-side session provider
//!
//! Resolves the session once per app load and keeps it consistent with
//! navigation afterwards.
//!
//! ```text
//! Unknown -> Loading -> Authenticated(profile)
//!                    \-> Anonymous
//! any state --logout event--> Anonymous (+ redirect to /login)
//! ```

use crate::api::AccountApi;
use crate::client::ApiClient;
use crate::events::SessionEvent;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use storefront_core::{
    UserProfile, ACCESS_TOKEN_COOKIE, HOME_PATH, LOGIN_PATH, REFRESH_TOKEN_COOKIE, REGISTER_PATH,
};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Session state as seen by the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "user", rename_all = "snake_case")]
pub enum SessionState {
    Unknown,
    Loading,
    Authenticated(UserProfile),
    Anonymous,
}

impl SessionState {
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// True until the first resolution completes
    pub fn is_pending(&self) -> bool {
        matches!(self, SessionState::Unknown | SessionState::Loading)
    }
}

/// Router abstraction the provider redirects through
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn replace(&self, path: &str);
}

/// Navigator that records redirects in memory
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    inner: Mutex<NavigatorState>,
}

#[derive(Debug, Default)]
struct NavigatorState {
    current: String,
    redirects: Vec<String>,
}

impl MemoryNavigator {
    pub fn at(path: &str) -> Self {
        Self {
            inner: Mutex::new(NavigatorState {
                current: path.to_string(),
                redirects: Vec::new(),
            }),
        }
    }

    /// Every path passed to `replace`, oldest first
    pub fn redirects(&self) -> Vec<String> {
        self.lock().redirects.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NavigatorState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.lock().current.clone()
    }

    fn replace(&self, path: &str) {
        let mut state = self.lock();
        state.current = path.to_string();
        state.redirects.push(path.to_string());
    }
}

fn is_auth_page(path: &str) -> bool {
    path == LOGIN_PATH || path == REGISTER_PATH
}

/// Owns the session state machine
pub struct SessionProvider {
    client: ApiClient,
    account: AccountApi,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<SessionState>,
}

impl SessionProvider {
    pub fn new(client: ApiClient, navigator: Arc<dyn Navigator>) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            account: AccountApi::new(client.clone()),
            client,
            navigator,
            state,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.borrow().user().cloned()
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Resolve the session and apply the redirect that follows from it
    pub async fn initialize(&self) -> SessionState {
        self.state.send_replace(SessionState::Loading);

        let resolved = self.resolve().await;
        info!(
            authenticated = resolved.user().is_some(),
            "Session resolved"
        );
        self.state.send_replace(resolved.clone());

        let path = self.navigator.current_path();
        match &resolved {
            SessionState::Authenticated(_) if is_auth_page(&path) => {
                self.navigator.replace(HOME_PATH);
            }
            SessionState::Anonymous if !is_auth_page(&path) => {
                self.navigator.replace(LOGIN_PATH);
            }
            _ => {}
        }

        resolved
    }

    /// Reset to anonymous and send the user to the login page
    pub fn handle_logout(&self) {
        info!("Session ended, redirecting to login");
        self.state.send_replace(SessionState::Anonymous);
        self.navigator.replace(LOGIN_PATH);
    }

    /// Listen for logout events for the lifetime of the provider
    pub fn spawn_logout_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.client.events().subscribe();
        let provider = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::LoggedOut { reason }) => {
                        debug!(?reason, "Logout event received");
                        provider.handle_logout();
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Logout listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    async fn resolve(&self) -> SessionState {
        let cookies = self.client.cookies();
        let access_token = cookies.get(ACCESS_TOKEN_COOKIE).await;
        let refresh_token = cookies.get(REFRESH_TOKEN_COOKIE).await;

        match (access_token, refresh_token) {
            (Some(_), _) => match self.account.profile_once().await {
                Ok(user) => SessionState::Authenticated(user),
                Err(e) if e.is_unauthorized() => {
                    debug!("Access token rejected, trying refresh");
                    self.refresh_and_fetch().await
                }
                Err(e) => {
                    warn!(error = %e, "Failed to fetch profile");
                    SessionState::Anonymous
                }
            },
            (None, Some(_)) => self.refresh_and_fetch().await,
            (None, None) => SessionState::Anonymous,
        }
    }

    async fn refresh_and_fetch(&self) -> SessionState {
        if let Err(e) = self.client.refresh_access_token().await {
            warn!(error = %e, "Refresh failed, clearing tokens");
            self.client.clear_tokens().await;
            return SessionState::Anonymous;
        }

        match self.account.profile_once().await {
            Ok(user) => SessionState::Authenticated(user),
            Err(e) => {
                warn!(error = %e, "Failed to fetch profile after refresh");
                SessionState::Anonymous
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_navigator_records_redirects() {
        let navigator = MemoryNavigator::at("/cart");
        navigator.replace("/login");
        navigator.replace("/");

        assert_eq!(navigator.current_path(), "/");
        assert_eq!(navigator.redirects(), vec!["/login", "/"]);
    }

    #[test]
    fn test_state_helpers() {
        assert!(SessionState::Unknown.is_pending());
        assert!(SessionState::Loading.is_pending());
        assert!(!SessionState::Anonymous.is_pending());
        assert!(SessionState::Anonymous.user().is_none());
    }
}
