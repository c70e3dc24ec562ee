use serde::Deserialize;
use std::{env, path::Path, path::PathBuf};
use tracing::warn;

pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_API_BASE: &str = "https://searchconsole.googleapis.com/webmasters/v3";

/// Which of the two dashboards this process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardVariant {
    /// Interactive user OAuth, cached token, top queries for 2023.
    Ranking,
    /// Pasted service-account key, rolling 28 days of pages with a filter.
    PagePerformance,
}

impl DashboardVariant {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ranking" | "oauth" => Some(Self::Ranking),
            "page_performance" | "page-performance" | "service_account" => {
                Some(Self::PagePerformance)
            }
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ranking => "ranking",
            Self::PagePerformance => "page_performance",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Ranking => "SEO Rank Checker",
            Self::PagePerformance => "Page Performance",
        }
    }

    pub fn dimension_label(self) -> &'static str {
        match self {
            Self::Ranking => "Query",
            Self::PagePerformance => "Page",
        }
    }
}

/// OAuth client registration used by the installed-app flow.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    pub auth_uri: String,
    pub token_uri: String,
    pub api_base: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            auth_uri: DEFAULT_AUTH_URI.to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub variant: DashboardVariant,
    pub token_cache_path: PathBuf,
    pub public_url: String,
    pub oauth_client: Option<OAuthClientConfig>,
    pub endpoints: ApiEndpoints,
}

impl AppConfig {
    pub fn redirect_uri(&self) -> String {
        format!("{}/oauth/callback", self.public_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct SecretsFile {
    google: Option<OAuthClientConfig>,
}

/// Builds the configuration from the process environment.
pub fn resolve_config() -> Result<AppConfig, String> {
    let port = match env::var("PORT") {
        Ok(value) => value
            .parse::<u16>()
            .map_err(|_| format!("PORT must be a port number, got {value:?}"))?,
        Err(_) => 8080,
    };

    let variant = match env::var("DASHBOARD_VARIANT") {
        Ok(value) => DashboardVariant::parse(&value)
            .ok_or_else(|| format!("unknown DASHBOARD_VARIANT {value:?}"))?,
        Err(_) => DashboardVariant::Ranking,
    };

    let token_cache_path = env::var("TOKEN_CACHE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("token.json"));

    let public_url =
        env::var("PUBLIC_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));

    let secrets_path = env::var("SECRETS_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("secrets.toml"));
    let oauth_client = match (env::var("GOOGLE_CLIENT_ID"), env::var("GOOGLE_CLIENT_SECRET")) {
        (Ok(client_id), Ok(client_secret)) => Some(OAuthClientConfig {
            client_id,
            client_secret,
        }),
        _ => load_secrets_file(&secrets_path),
    };

    let defaults = ApiEndpoints::default();
    let endpoints = ApiEndpoints {
        auth_uri: env::var("GOOGLE_AUTH_URI").unwrap_or(defaults.auth_uri),
        token_uri: env::var("GOOGLE_TOKEN_URI").unwrap_or(defaults.token_uri),
        api_base: env::var("GOOGLE_API_BASE").unwrap_or(defaults.api_base),
    };

    Ok(AppConfig {
        port,
        variant,
        token_cache_path,
        public_url,
        oauth_client,
        endpoints,
    })
}

fn load_secrets_file(path: &Path) -> Option<OAuthClientConfig> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!("failed to read secrets file {}: {err}", path.display());
            return None;
        }
    };
    parse_secrets(&contents)
}

fn parse_secrets(contents: &str) -> Option<OAuthClientConfig> {
    match toml::from_str::<SecretsFile>(contents) {
        Ok(secrets) => secrets.google,
        Err(err) => {
            warn!("failed to parse secrets file: {err}");
            None
        }
    }
}
