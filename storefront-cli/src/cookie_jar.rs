//! Cookie jar persisted between CLI invocations

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use storefront_core::{ErrorContext, StorefrontError, StorefrontResult};
use storefront_session::{CookieStore, MemoryCookieStore, StoredCookie};
use tracing::{debug, warn};

/// Jar kept in memory and written to a JSON file after every change
#[derive(Debug, Clone)]
pub struct FileCookieStore {
    path: PathBuf,
    inner: MemoryCookieStore,
}

impl FileCookieStore {
    /// `<data dir>/storefront/cookies.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("storefront").join("cookies.json"))
    }

    /// Open the jar at `path`, starting empty when the file does not exist
    pub async fn load(path: impl AsRef<Path>) -> StorefrontResult<Self> {
        let path = path.as_ref().to_path_buf();

        let cookies: Vec<StoredCookie> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StorefrontError::Config {
                message: format!("Cookie jar {:?} is corrupt: {}", path, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("cookie_jar")
                    .with_operation("load")
                    .with_suggestion("Delete the file and log in again"),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(count = cookies.len(), "Loaded cookie jar from {:?}", path);
        Ok(Self {
            path,
            inner: MemoryCookieStore::with_cookies(cookies),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self) {
        let cookies = self.inner.snapshot().await;
        if let Err(e) = self.write(&cookies).await {
            warn!("Failed to save cookie jar to {:?}: {}", self.path, e);
        }
    }

    async fn write(&self, cookies: &[StoredCookie]) -> StorefrontResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(cookies)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl CookieStore for FileCookieStore {
    async fn get(&self, name: &str) -> Option<String> {
        self.inner.get(name).await
    }

    async fn set(&self, cookie: StoredCookie) {
        self.inner.set(cookie).await;
        self.persist().await;
    }

    async fn remove(&self, name: &str) {
        self.inner.remove(name).await;
        self.persist().await;
    }

    async fn all(&self) -> Vec<StoredCookie> {
        self.inner.all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};

    #[tokio::test]
    async fn test_jar_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cookies.json");

        let jar = FileCookieStore::load(&path).await.unwrap();
        assert!(jar.all().await.is_empty());

        jar.set(StoredCookie::session(REFRESH_TOKEN_COOKIE, "r1")).await;
        jar.set(StoredCookie::session(ACCESS_TOKEN_COOKIE, "a1")).await;

        let reloaded = FileCookieStore::load(&path).await.unwrap();
        assert_eq!(reloaded.get(REFRESH_TOKEN_COOKIE).await.as_deref(), Some("r1"));
        assert_eq!(reloaded.get(ACCESS_TOKEN_COOKIE).await.as_deref(), Some("a1"));

        reloaded.clear_tokens().await;
        let emptied = FileCookieStore::load(&path).await.unwrap();
        assert!(emptied.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_jar_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileCookieStore::load(&path).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Config { .. }));
    }
}
