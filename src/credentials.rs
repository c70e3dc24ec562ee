use crate::errors::AuthError;
use crate::models::{Credential, TokenResponse};
use async_trait::async_trait;
use tracing::warn;

/// Read-only access to Search Console data.
pub const WEBMASTERS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/webmasters.readonly";

pub fn default_scopes() -> Vec<String> {
    vec![WEBMASTERS_READONLY_SCOPE.to_string()]
}

/// Source of bearer credentials for the Search Console API.
///
/// Implementations never retry: every failure is returned to the caller as
/// an [`AuthError`] and the operator re-triggers the action.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Short name used in logs and the session view.
    fn kind(&self) -> &'static str;

    /// Returns a credential valid for `scopes`.
    async fn acquire(&self, scopes: &[String]) -> Result<Credential, AuthError>;
}

pub(crate) fn ensure_scopes(scopes: &[String]) -> Result<(), AuthError> {
    if scopes.iter().all(|scope| scope.trim().is_empty()) {
        return Err(AuthError::MissingScopes);
    }
    Ok(())
}

/// Posts a form-encoded grant to an OAuth token endpoint.
pub(crate) async fn request_token(
    http: &reqwest::Client,
    token_uri: &str,
    params: &[(&str, &str)],
) -> Result<TokenResponse, AuthError> {
    let response = http
        .post(token_uri)
        .form(params)
        .send()
        .await
        .map_err(|err| AuthError::TokenEndpoint(err.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        warn!(%status, "token endpoint returned an error");
        return Err(AuthError::TokenEndpoint(format!("{status}: {body}")));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|err| AuthError::TokenEndpoint(format!("invalid token response: {err}")))
}
