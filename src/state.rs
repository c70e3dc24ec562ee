use crate::client::SearchConsoleClient;
use crate::config::{AppConfig, DashboardVariant};
use crate::credentials::{default_scopes, CredentialProvider};
use crate::oauth::InstalledAppProvider;
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub http: reqwest::Client,
    pub client: SearchConsoleClient,
    pub scopes: Arc<Vec<String>>,
    /// Present only for the ranking dashboard.
    pub installed: Option<Arc<InstalledAppProvider>>,
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let http = reqwest::Client::new();
        let client = SearchConsoleClient::new(http.clone(), config.endpoints.api_base.clone());

        let (installed, session) = match config.variant {
            DashboardVariant::Ranking => {
                let provider = Arc::new(InstalledAppProvider::new(http.clone(), &config));
                let session = Session::with_provider(
                    Arc::clone(&provider) as Arc<dyn CredentialProvider>,
                    Some("Google account".to_string()),
                );
                (Some(provider), session)
            }
            DashboardVariant::PagePerformance => (None, Session::default()),
        };

        Self {
            config: Arc::new(config),
            http,
            client,
            scopes: Arc::new(default_scopes()),
            installed,
            session: Arc::new(Mutex::new(session)),
        }
    }

    pub fn variant(&self) -> DashboardVariant {
        self.config.variant
    }
}
