//! Service-account credentials built from a key pasted by the operator.
//!
//! The key is parsed as strict JSON and held in memory only. Each
//! acquisition signs a short-lived RS256 assertion and trades it for an
//! access token at the key's token endpoint.

use crate::credentials::{ensure_scopes, request_token, CredentialProvider};
use crate::errors::AuthError;
use crate::models::Credential;
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub account_type: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("project_id", &self.project_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl ServiceAccountKey {
    /// Parses a pasted key document. Never evaluates the text.
    pub fn parse(text: &str) -> Result<Self, AuthError> {
        let key: ServiceAccountKey = serde_json::from_str(text.trim())
            .map_err(|err| AuthError::MalformedKey(err.to_string()))?;

        if key.account_type != "service_account" {
            return Err(AuthError::MalformedKey(format!(
                "expected type \"service_account\", got {:?}",
                key.account_type
            )));
        }
        if key.client_email.trim().is_empty() {
            return Err(AuthError::MalformedKey("client_email is empty".into()));
        }
        if key.private_key.trim().is_empty() {
            return Err(AuthError::MalformedKey("private_key is empty".into()));
        }
        Ok(key)
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

pub struct ServiceAccountProvider {
    http: reqwest::Client,
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    token_uri: String,
}

impl ServiceAccountProvider {
    /// `default_token_uri` is used when the key does not name its own endpoint.
    pub fn from_json(
        http: reqwest::Client,
        text: &str,
        default_token_uri: &str,
    ) -> Result<Self, AuthError> {
        let key = ServiceAccountKey::parse(text)?;
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|err| AuthError::MalformedKey(format!("private_key: {err}")))?;
        let token_uri = key
            .token_uri
            .clone()
            .filter(|uri| !uri.trim().is_empty())
            .unwrap_or_else(|| default_token_uri.to_string());

        Ok(Self {
            http,
            key,
            signing_key,
            token_uri,
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn assertion(&self, scopes: &[String]) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: scopes.join(" "),
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        encode(&header, &claims, &self.signing_key).map_err(|err| AuthError::Signing(err.to_string()))
    }
}

#[async_trait]
impl CredentialProvider for ServiceAccountProvider {
    fn kind(&self) -> &'static str {
        "service_account"
    }

    #[instrument(skip_all)]
    async fn acquire(&self, scopes: &[String]) -> Result<Credential, AuthError> {
        ensure_scopes(scopes)?;
        let assertion = self.assertion(scopes)?;
        let response = request_token(
            &self.http,
            &self.token_uri,
            &[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())],
        )
        .await?;
        info!(account = %self.key.client_email, "obtained service account token");
        Ok(response.into_credential(None, scopes, Utc::now()))
    }
}

#[cfg(test)]
pub(crate) fn test_key_json(token_uri: &str) -> String {
    serde_json::json!({
        "type": "service_account",
        "project_id": "demo-project",
        "private_key_id": "kid-1",
        "private_key": include_str!("../tests/fixtures/service_account_key.pem"),
        "client_email": "reporter@demo-project.iam.gserviceaccount.com",
        "client_id": "1234567890",
        "token_uri": token_uri,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::default_scopes;
    use crate::testing;
    use serde_json::json;

    #[test]
    fn malformed_json_is_rejected() {
        let err = ServiceAccountProvider::from_json(reqwest::Client::new(), "{ not json", "x")
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::MalformedKey(_)));
    }

    #[test]
    fn expression_text_is_not_evaluated() {
        let err = ServiceAccountKey::parse("__import__('os').system('true')").unwrap_err();
        assert!(matches!(err, AuthError::MalformedKey(_)));
    }

    #[test]
    fn wrong_key_type_is_rejected() {
        let text = json!({
            "type": "authorized_user",
            "client_email": "a@b",
            "private_key": "k",
        })
        .to_string();
        assert!(matches!(
            ServiceAccountKey::parse(&text),
            Err(AuthError::MalformedKey(_))
        ));
    }

    #[test]
    fn unparsable_private_key_is_rejected() {
        let text = json!({
            "type": "service_account",
            "client_email": "a@b",
            "private_key": "definitely not a pem document",
        })
        .to_string();
        let err = ServiceAccountProvider::from_json(reqwest::Client::new(), &text, "x")
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::MalformedKey(_)));
    }

    #[test]
    fn debug_output_hides_private_key() {
        let key = ServiceAccountKey::parse(&test_key_json("http://t")).unwrap();
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("BEGIN PRIVATE KEY"));
        assert!(rendered.contains("reporter@demo-project"));
    }

    #[tokio::test]
    async fn acquire_exchanges_signed_assertion() {
        let mock = testing::spawn(json!({}), json!({})).await;
        let provider = ServiceAccountProvider::from_json(
            reqwest::Client::new(),
            &test_key_json(&mock.token_uri()),
            "http://127.0.0.1:9/token",
        )
        .unwrap();

        let credential = provider.acquire(&default_scopes()).await.unwrap();
        assert_eq!(credential.access_token, format!("mock-{JWT_BEARER_GRANT}"));
        assert!(credential.refresh_token.is_none());
        assert!(credential.expires_at.unwrap() > Utc::now());
        assert!(!credential.is_expired());

        let forms = mock.token_forms();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0]["grant_type"], JWT_BEARER_GRANT);
        assert_eq!(forms[0]["assertion"].split('.').count(), 3);
    }

    #[tokio::test]
    async fn acquire_without_scopes_fails() {
        let provider = ServiceAccountProvider::from_json(
            reqwest::Client::new(),
            &test_key_json("http://127.0.0.1:9/token"),
            "http://127.0.0.1:9/token",
        )
        .unwrap();
        assert!(matches!(
            provider.acquire(&[]).await,
            Err(AuthError::MissingScopes)
        ));
    }
}
