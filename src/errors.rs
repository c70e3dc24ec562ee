use axum::http::StatusCode;
use axum::Json;
use thiserror::Error;

/// Failures while obtaining or validating a credential.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable token; the operator has to grant access in the browser.
    #[error("Google account not connected: open the consent page to grant access")]
    ConsentRequired { url: String },

    #[error("OAuth client id and secret are not configured")]
    MissingClientConfig,

    #[error("no OAuth scopes requested")]
    MissingScopes,

    #[error("service account key is malformed: {0}")]
    MalformedKey(String),

    #[error("could not sign service account assertion: {0}")]
    Signing(String),

    #[error("token endpoint rejected the request: {0}")]
    TokenEndpoint(String),

    #[error("token cache error: {0}")]
    TokenCache(String),

    #[error("credential has expired")]
    Expired,

    #[error("not authenticated")]
    NotAuthenticated,
}

/// Failures talking to the Search Console API.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not decode API response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Http(err.to_string())
        }
    }
}

/// Anything the report pipeline can fail with.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Input(String),
}

impl DashboardError {
    pub fn status(&self) -> StatusCode {
        match self {
            DashboardError::Auth(_) => StatusCode::UNAUTHORIZED,
            DashboardError::Transport(_) => StatusCode::BAD_GATEWAY,
            DashboardError::Input(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        Self {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        DashboardError::from(err).into()
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}
