//! Installed-app OAuth flow for a single interactive user.
//!
//! The cached token is replayed while valid, refreshed in place when it has
//! expired and carries a refresh token, and otherwise the operator is sent to
//! Google's consent page. The consent redirect lands on `/oauth/callback`,
//! which calls [`InstalledAppProvider::complete_consent`].

use crate::config::{AppConfig, OAuthClientConfig};
use crate::credentials::{ensure_scopes, request_token, CredentialProvider};
use crate::errors::AuthError;
use crate::models::Credential;
use crate::storage::TokenCache;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};
use url::Url;

pub struct InstalledAppProvider {
    http: reqwest::Client,
    client: Option<OAuthClientConfig>,
    auth_uri: String,
    token_uri: String,
    redirect_uri: String,
    cache: TokenCache,
}

impl InstalledAppProvider {
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            client: config.oauth_client.clone(),
            auth_uri: config.endpoints.auth_uri.clone(),
            token_uri: config.endpoints.token_uri.clone(),
            redirect_uri: config.redirect_uri(),
            cache: TokenCache::new(config.token_cache_path.clone()),
        }
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    fn client(&self) -> Result<&OAuthClientConfig, AuthError> {
        self.client.as_ref().ok_or(AuthError::MissingClientConfig)
    }

    /// Google consent page for `scopes`, redirecting back to this dashboard.
    pub fn consent_url(&self, scopes: &[String]) -> Result<String, AuthError> {
        ensure_scopes(scopes)?;
        let client = self.client()?;
        let scope = scopes.join(" ");
        let url = Url::parse_with_params(
            &self.auth_uri,
            &[
                ("client_id", client.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|err| AuthError::TokenEndpoint(format!("invalid auth uri: {err}")))?;
        Ok(url.to_string())
    }

    /// Exchanges an authorization code and caches the resulting token.
    #[instrument(skip(self, code))]
    pub async fn complete_consent(
        &self,
        code: &str,
        scopes: &[String],
    ) -> Result<Credential, AuthError> {
        ensure_scopes(scopes)?;
        let client = self.client()?;
        let response = request_token(
            &self.http,
            &self.token_uri,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
            ],
        )
        .await?;

        let credential = response.into_credential(None, scopes, Utc::now());
        self.cache.persist(&credential).await?;
        info!("stored new OAuth token");
        Ok(credential)
    }

    #[instrument(skip(self, credential))]
    async fn refresh(
        &self,
        credential: &Credential,
        scopes: &[String],
    ) -> Result<Credential, AuthError> {
        let client = self.client()?;
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or(AuthError::NotAuthenticated)?;

        info!("refreshing expired OAuth token");
        let response = request_token(
            &self.http,
            &self.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
            ],
        )
        .await?;

        let scopes = if credential.scopes.is_empty() {
            scopes
        } else {
            credential.scopes.as_slice()
        };
        let refreshed =
            response.into_credential(credential.refresh_token.clone(), scopes, Utc::now());
        self.cache.persist(&refreshed).await?;
        Ok(refreshed)
    }
}

#[async_trait]
impl CredentialProvider for InstalledAppProvider {
    fn kind(&self) -> &'static str {
        "installed_app"
    }

    async fn acquire(&self, scopes: &[String]) -> Result<Credential, AuthError> {
        ensure_scopes(scopes)?;
        match self.cache.load().await {
            Some(credential) if !credential.is_expired() => Ok(credential),
            Some(credential) if credential.can_refresh() => {
                self.refresh(&credential, scopes).await
            }
            _ => Err(AuthError::ConsentRequired {
                url: self.consent_url(scopes)?,
            }),
        }
    }
}
