//! Cookie jar for the session tokens
//!
//! Plays the part of the browser's cookie store: expired cookies read as
//! absent, `Set-Cookie` headers from the backend are captured, and the jar
//! renders a `Cookie` header for credentialed requests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use storefront_core::{StorefrontConfig, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use tokio::sync::RwLock;
use tracing::debug;

/// A cookie as kept in the jar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site_strict: bool,
}

impl StoredCookie {
    pub fn session(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            expires_at: None,
            path: "/".to_string(),
            secure: false,
            http_only: false,
            same_site_strict: false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Parse a `Set-Cookie` header value
    pub fn from_set_cookie(header: &str) -> Option<Self> {
        let parsed = Cookie::parse(header.to_string()).ok()?;
        let now = Utc::now();

        let expires_at = match (parsed.max_age(), parsed.expires_datetime()) {
            (Some(max_age), _) => expiry_after(now, max_age.whole_seconds()),
            (None, Some(at)) => DateTime::from_timestamp(at.unix_timestamp(), 0),
            (None, None) => None,
        };

        Some(Self {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            expires_at,
            path: parsed.path().unwrap_or("/").to_string(),
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            same_site_strict: parsed.same_site() == Some(SameSite::Strict),
        })
    }
}

/// Expiry for a `Max-Age` in seconds. Zero or negative expires at once,
/// anything past what a timestamp can hold is kept as a session cookie.
fn expiry_after(now: DateTime<Utc>, max_age_seconds: i64) -> Option<DateTime<Utc>> {
    if max_age_seconds <= 0 {
        return Some(now);
    }
    Duration::try_seconds(max_age_seconds).and_then(|ttl| now.checked_add_signed(ttl))
}

/// Attributes applied to the access token cookie we write ourselves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    pub access_token_ttl: Duration,
    pub secure: bool,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            access_token_ttl: Duration::minutes(storefront_core::ACCESS_TOKEN_TTL_MINUTES),
            secure: false,
        }
    }
}

impl CookiePolicy {
    pub fn from_config(config: &StorefrontConfig) -> Self {
        Self {
            access_token_ttl: Duration::minutes(config.session.access_token_ttl_minutes),
            secure: config.is_production(),
        }
    }

    /// Access token cookie: short expiry, path `/`, strict same-site
    pub fn access_token(&self, value: &str) -> StoredCookie {
        StoredCookie {
            name: ACCESS_TOKEN_COOKIE.to_string(),
            value: value.to_string(),
            expires_at: Some(Utc::now() + self.access_token_ttl),
            path: "/".to_string(),
            secure: self.secure,
            http_only: false,
            same_site_strict: true,
        }
    }
}

/// Storage for session cookies
#[async_trait]
pub trait CookieStore: Send + Sync {
    /// Value of a live cookie
    async fn get(&self, name: &str) -> Option<String>;

    /// Insert or replace a cookie
    async fn set(&self, cookie: StoredCookie);

    /// Delete a cookie
    async fn remove(&self, name: &str);

    /// Every live cookie
    async fn all(&self) -> Vec<StoredCookie>;

    /// `Cookie` header for a credentialed request
    async fn header_value(&self) -> Option<String> {
        let cookies = self.all().await;
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Remove both session tokens
    async fn clear_tokens(&self) {
        self.remove(ACCESS_TOKEN_COOKIE).await;
        self.remove(REFRESH_TOKEN_COOKIE).await;
    }

    /// Apply a `Set-Cookie` header, honouring deletion by expiry
    async fn apply_set_cookie(&self, header: &str) {
        let Some(cookie) = StoredCookie::from_set_cookie(header) else {
            debug!("Ignoring malformed Set-Cookie header");
            return;
        };

        if cookie.is_expired(Utc::now()) {
            debug!(cookie = %cookie.name, "Backend expired cookie");
            self.remove(&cookie.name).await;
        } else {
            debug!(cookie = %cookie.name, "Captured cookie from backend");
            self.set(cookie).await;
        }
    }
}

/// In-memory cookie jar
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieStore {
    cookies: Arc<RwLock<HashMap<String, StoredCookie>>>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jar pre-filled with cookies, mostly for tests and restored sessions
    pub fn with_cookies(cookies: impl IntoIterator<Item = StoredCookie>) -> Self {
        let map = cookies.into_iter().map(|c| (c.name.clone(), c)).collect();
        Self {
            cookies: Arc::new(RwLock::new(map)),
        }
    }

    /// Snapshot of the live cookies
    pub async fn snapshot(&self) -> Vec<StoredCookie> {
        self.all().await
    }
}

#[async_trait]
impl CookieStore for MemoryCookieStore {
    async fn get(&self, name: &str) -> Option<String> {
        let cookies = self.cookies.read().await;
        cookies
            .get(name)
            .filter(|c| !c.is_expired(Utc::now()))
            .map(|c| c.value.clone())
    }

    async fn set(&self, cookie: StoredCookie) {
        let mut cookies = self.cookies.write().await;
        cookies.insert(cookie.name.clone(), cookie);
    }

    async fn remove(&self, name: &str) {
        let mut cookies = self.cookies.write().await;
        cookies.remove(name);
    }

    async fn all(&self) -> Vec<StoredCookie> {
        let now = Utc::now();
        let cookies = self.cookies.read().await;
        let mut live: Vec<_> = cookies
            .values()
            .filter(|c| !c.is_expired(now))
            .cloned()
            .collect();
        live.sort_by(|a, b| a.name.cmp(&b.name));
        live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_expired_cookie_reads_as_absent() {
        let mut stale = StoredCookie::session(ACCESS_TOKEN_COOKIE, "old");
        stale.expires_at = Some(Utc::now() - Duration::minutes(1));
        let store = MemoryCookieStore::with_cookies([stale]);

        assert_eq!(store.get(ACCESS_TOKEN_COOKIE).await, None);
        assert!(store.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_access_token_policy() {
        let policy = CookiePolicy {
            access_token_ttl: Duration::minutes(15),
            secure: true,
        };
        let cookie = policy.access_token("abc");

        assert_eq!(cookie.name, ACCESS_TOKEN_COOKIE);
        assert!(cookie.secure);
        assert!(cookie.same_site_strict);
        assert_eq!(cookie.path, "/");
        let ttl = cookie.expires_at.unwrap() - Utc::now();
        assert!(ttl > Duration::minutes(14) && ttl <= Duration::minutes(15));
    }

    #[tokio::test]
    async fn test_apply_set_cookie() {
        let store = MemoryCookieStore::new();

        store
            .apply_set_cookie("refreshToken=r1; Path=/; HttpOnly; Max-Age=604800")
            .await;
        assert_eq!(store.get(REFRESH_TOKEN_COOKIE).await.as_deref(), Some("r1"));

        store
            .apply_set_cookie("refreshToken=; Path=/; Max-Age=0")
            .await;
        assert_eq!(store.get(REFRESH_TOKEN_COOKIE).await, None);
    }

    #[tokio::test]
    async fn test_header_value_and_clear() {
        let store = MemoryCookieStore::with_cookies([
            StoredCookie::session(REFRESH_TOKEN_COOKIE, "r"),
            StoredCookie::session(ACCESS_TOKEN_COOKIE, "a"),
        ]);

        assert_eq!(
            store.header_value().await.as_deref(),
            Some("accessToken=a; refreshToken=r")
        );

        store.clear_tokens().await;
        assert_eq!(store.header_value().await, None);
    }

    #[tokio::test]
    async fn test_huge_max_age_is_kept_without_expiry() {
        let cookie =
            StoredCookie::from_set_cookie("refreshToken=r1; Path=/; Max-Age=99999999999999").unwrap();
        assert_eq!(cookie.value, "r1");
        assert!(cookie.expires_at.is_none());

        let store = MemoryCookieStore::new();
        store
            .apply_set_cookie("refreshToken=r2; Path=/; Max-Age=99999999999999999999")
            .await;
        assert_eq!(store.get(REFRESH_TOKEN_COOKIE).await.as_deref(), Some("r2"));
    }

    #[test]
    fn test_negative_max_age_expires_immediately() {
        let cookie = StoredCookie::from_set_cookie("accessToken=; Max-Age=-1").unwrap();
        assert!(cookie.is_expired(Utc::now()));
    }

    #[test]
    fn test_parse_set_cookie_attributes() {
        let cookie = StoredCookie::from_set_cookie(
            "accessToken=tok; Path=/; Secure; SameSite=Strict; Max-Age=900",
        )
        .unwrap();

        assert_eq!(cookie.value, "tok");
        assert!(cookie.secure);
        assert!(cookie.same_site_strict);
        assert!(!cookie.http_only);
        assert!(cookie.expires_at.is_some());
    }
}
