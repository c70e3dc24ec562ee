use crate::client::{build_request, SearchConsoleClient};
use crate::config::DashboardVariant;
use crate::credentials::CredentialProvider;
use crate::errors::{AuthError, DashboardError};
use crate::models::{Credential, QueryOutcome, SiteEntry};
use crate::presenter::{present, DisplayTable};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub site_url: String,
    pub filter: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub table: DisplayTable,
}

/// Everything one interactive session knows. Replaced wholesale on sign-out.
#[derive(Default)]
pub struct Session {
    pub provider: Option<Arc<dyn CredentialProvider>>,
    pub account: Option<String>,
    pub credential: Option<Credential>,
    /// `None` until listed; listed at most once per credential.
    pub sites: Option<Vec<SiteEntry>>,
    pub report: Option<ReportView>,
    pub error: Option<String>,
}

impl Session {
    pub fn with_provider(provider: Arc<dyn CredentialProvider>, account: Option<String>) -> Self {
        Self {
            provider: Some(provider),
            account,
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.as_ref().is_some_and(|c| !c.is_expired())
    }

    pub fn site_urls(&self) -> Vec<String> {
        self.sites
            .iter()
            .flatten()
            .map(|site| site.site_url.clone())
            .collect()
    }

    /// Returns the held credential while valid, otherwise asks the provider.
    pub async fn ensure_credential(&mut self, scopes: &[String]) -> Result<Credential, AuthError> {
        if let Some(credential) = self.credential.as_ref().filter(|c| !c.is_expired()) {
            return Ok(credential.clone());
        }
        let provider = self.provider.clone().ok_or(AuthError::NotAuthenticated)?;
        let credential = provider.acquire(scopes).await?;
        info!(provider = provider.kind(), "session authenticated");
        self.credential = Some(credential.clone());
        Ok(credential)
    }

    pub async fn ensure_sites(
        &mut self,
        client: &SearchConsoleClient,
        scopes: &[String],
    ) -> Result<Vec<SiteEntry>, DashboardError> {
        if let Some(sites) = &self.sites {
            return Ok(sites.clone());
        }
        let credential = self.ensure_credential(scopes).await?;
        let sites = client.list_sites(&credential).await?;
        self.sites = Some(sites.clone());
        Ok(sites)
    }

    /// Runs one report action and keeps its view for the dashboard page.
    pub async fn run_report(
        &mut self,
        client: &SearchConsoleClient,
        variant: DashboardVariant,
        scopes: &[String],
        site_url: &str,
        filter: Option<&str>,
        today: NaiveDate,
    ) -> Result<ReportView, DashboardError> {
        let site_url = site_url.trim();
        if site_url.is_empty() {
            return Err(DashboardError::Input("enter a site URL".into()));
        }

        let sites = self.ensure_sites(client, scopes).await?;
        if sites.is_empty() {
            return Err(DashboardError::Input(
                "no sites are registered for this account".into(),
            ));
        }

        let credential = self.ensure_credential(scopes).await?;
        let request = build_request(variant, today);
        let outcome = client.query(&credential, site_url, &request).await?;

        let filter = match variant {
            DashboardVariant::Ranking => None,
            DashboardVariant::PagePerformance => Some(filter.unwrap_or("").to_string()),
        };
        let table = match outcome {
            QueryOutcome::Rows(rows) => present(&rows, filter.as_deref()),
            QueryOutcome::Empty => DisplayTable::NoData,
        };

        let view = ReportView {
            site_url: site_url.to_string(),
            filter,
            start_date: request.start_date,
            end_date: request.end_date,
            table,
        };
        self.report = Some(view.clone());
        self.error = None;
        Ok(view)
    }

    /// Drops the previous report so the page shows only the failure.
    pub fn fail_report(&mut self, err: &DashboardError) {
        self.report = None;
        self.error = Some(err.to_string());
    }

    /// Forgets the credential and everything fetched with it.
    pub fn sign_out(&mut self, keep_provider: bool) {
        let provider = if keep_provider { self.provider.take() } else { None };
        let account = if keep_provider { self.account.take() } else { None };
        *self = Self {
            provider,
            account,
            ..Self::default()
        };
    }
}
