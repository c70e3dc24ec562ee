use crate::config::DashboardVariant;
use crate::errors::{AuthError, DashboardError, TransportError};
use crate::models::{
    Credential, QueryOutcome, QueryRequest, QueryResponse, SiteEntry, SitesResponse,
};
use chrono::{Duration, NaiveDate};
use reqwest::Response;
use tracing::{debug, info, instrument};
use url::Url;

/// Days covered by the rolling page-performance window.
const ROLLING_WINDOW_DAYS: i64 = 28;

/// Request body for one report action of `variant`, relative to `today`.
pub fn build_request(variant: DashboardVariant, today: NaiveDate) -> QueryRequest {
    match variant {
        DashboardVariant::Ranking => QueryRequest {
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(today),
            end_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or(today),
            dimensions: vec!["query".to_string()],
            row_limit: 10,
            aggregation_type: None,
            search_type: None,
            data_state: None,
        },
        DashboardVariant::PagePerformance => QueryRequest {
            start_date: today - Duration::days(ROLLING_WINDOW_DAYS),
            end_date: today,
            dimensions: vec!["page".to_string()],
            row_limit: 1000,
            aggregation_type: Some("auto".to_string()),
            search_type: Some("web".to_string()),
            data_state: None,
        },
    }
}

/// Thin client over the Search Console `webmasters/v3` API.
#[derive(Debug, Clone)]
pub struct SearchConsoleClient {
    http: reqwest::Client,
    api_base: String,
}

impl SearchConsoleClient {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|err| TransportError::Http(format!("invalid API base: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| TransportError::Http("API base cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sites the credential's account can read. An account without sites
    /// yields an empty list.
    #[instrument(skip_all)]
    pub async fn list_sites(&self, credential: &Credential) -> Result<Vec<SiteEntry>, DashboardError> {
        ensure_fresh(credential)?;
        let url = self.endpoint(&["sites"])?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&credential.access_token)
            .send()
            .await
            .map_err(TransportError::from)?;
        let sites: SitesResponse = decode(response).await?;
        info!(count = sites.site_entry.len(), "listed sites");
        Ok(sites.site_entry)
    }

    /// Runs one search-analytics query for `site`.
    #[instrument(skip(self, credential, request), fields(dimensions = ?request.dimensions))]
    pub async fn query(
        &self,
        credential: &Credential,
        site: &str,
        request: &QueryRequest,
    ) -> Result<QueryOutcome, DashboardError> {
        ensure_fresh(credential)?;
        let url = self.endpoint(&["sites", site, "searchAnalytics", "query"])?;
        debug!(%url, "querying search analytics");
        let response = self
            .http
            .post(url)
            .bearer_auth(&credential.access_token)
            .json(request)
            .send()
            .await
            .map_err(TransportError::from)?;
        let body: QueryResponse = decode(response).await?;

        match body.rows {
            Some(rows) if !rows.is_empty() => {
                info!(rows = rows.len(), "query returned rows");
                Ok(QueryOutcome::Rows(rows))
            }
            _ => {
                info!("query returned no rows");
                Ok(QueryOutcome::Empty)
            }
        }
    }
}

fn ensure_fresh(credential: &Credential) -> Result<(), AuthError> {
    if credential.is_expired() {
        return Err(AuthError::Expired);
    }
    Ok(())
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::Api {
            status: status.as_u16(),
            message: api_message(&body),
        });
    }
    response.json::<T>().await.map_err(|err| TransportError::Decode(err.to_string()))
}

/// Google error bodies look like `{"error": {"message": ...}}`.
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
