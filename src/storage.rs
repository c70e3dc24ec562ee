use crate::errors::AuthError;
use crate::models::Credential;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, error};

/// On-disk cache for the installed-app OAuth credential.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Unreadable or corrupt caches are reported and treated as empty.
    pub async fn load(&self) -> Option<Credential> {
        match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(credential) => Some(credential),
                Err(err) => {
                    error!("failed to parse token cache: {err}");
                    None
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cached token");
                None
            }
            Err(err) => {
                error!("failed to read token cache: {err}");
                None
            }
        }
    }

    pub async fn persist(&self, credential: &Credential) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| AuthError::TokenCache(err.to_string()))?;
        }
        let payload = serde_json::to_vec_pretty(credential)
            .map_err(|err| AuthError::TokenCache(err.to_string()))?;
        fs::write(&self.path, payload)
            .await
            .map_err(|err| AuthError::TokenCache(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_cache_loads_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let cache = TokenCache::new(temp_dir.path().join("token.json"));
        assert!(cache.load().await.is_none());
    }

    #[tokio::test]
    async fn persisted_credential_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let cache = TokenCache::new(temp_dir.path().join("nested").join("token.json"));
        let credential = Credential {
            access_token: "abc".into(),
            refresh_token: Some("r".into()),
            expires_at: None,
            issued_at: None,
            scopes: vec!["s".into()],
        };
        cache.persist(&credential).await.unwrap();
        assert_eq!(cache.load().await, Some(credential));
    }

    #[tokio::test]
    async fn corrupt_cache_loads_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("token.json");
        fs::write(&path, b"\x80not json").await.unwrap();
        assert!(TokenCache::new(path).load().await.is_none());
    }
}
