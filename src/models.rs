use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Tokens are treated as expired this long before their actual expiry,
/// capped at half of the token's lifetime.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credential {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// A credential without an expiry never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now + self.expiry_skew(),
            None => false,
        }
    }

    fn expiry_skew(&self) -> Duration {
        let skew = Duration::seconds(EXPIRY_SKEW_SECS);
        match (self.issued_at, self.expires_at) {
            (Some(issued_at), Some(expires_at)) => skew.min((expires_at - issued_at) / 2),
            _ => skew,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|token| !token.is_empty())
    }
}

/// Successful reply from the OAuth token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// `previous_refresh` is kept when the endpoint does not rotate the refresh token.
    pub fn into_credential(
        self,
        previous_refresh: Option<String>,
        requested_scopes: &[String],
        now: DateTime<Utc>,
    ) -> Credential {
        let scopes = match self.scope {
            Some(scope) if !scope.trim().is_empty() => {
                scope.split_whitespace().map(str::to_string).collect()
            }
            _ => requested_scopes.to_vec(),
        };
        Credential {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: self.expires_in.map(|secs| now + Duration::seconds(secs)),
            issued_at: Some(now),
            scopes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEntry {
    pub site_url: String,
    #[serde(default)]
    pub permission_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitesResponse {
    #[serde(default)]
    pub site_entry: Vec<SiteEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dimensions: Vec<String>,
    pub row_limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation_type: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub search_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default, deserialize_with = "count_from_number")]
    pub clicks: u64,
    #[serde(default, deserialize_with = "count_from_number")]
    pub impressions: u64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub position: f64,
}

impl ReportRow {
    pub fn key(&self) -> String {
        self.keys.join(", ")
    }
}

// The API encodes counts as JSON numbers that may carry a fraction part.
fn count_from_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.max(0.0).round() as u64)
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub rows: Option<Vec<ReportRow>>,
}

/// Result of a query that reached the API.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows(Vec<ReportRow>),
    Empty,
}

#[derive(Debug, Deserialize)]
pub struct ReportForm {
    pub site_url: String,
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceAccountForm {
    pub key_json: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub variant: String,
    pub authenticated: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub sites: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, min, 0).unwrap()
    }

    #[test]
    fn credential_expiry_includes_skew() {
        let credential = Credential {
            access_token: "t".into(),
            refresh_token: None,
            expires_at: Some(at(12, 0)),
            issued_at: None,
            scopes: vec![],
        };
        assert!(!credential.is_expired_at(at(11, 58)));
        assert!(credential.is_expired_at(at(11, 59)));
        assert!(credential.is_expired_at(at(13, 0)));
    }

    #[test]
    fn credential_without_expiry_never_expires() {
        let credential = Credential {
            access_token: "t".into(),
            refresh_token: Some(String::new()),
            expires_at: None,
            issued_at: None,
            scopes: vec![],
        };
        assert!(!credential.is_expired_at(at(23, 59)));
        assert!(!credential.can_refresh());
    }

    #[test]
    fn token_response_keeps_previous_refresh_token() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"new","expires_in":3600}"#).unwrap();
        let credential =
            response.into_credential(Some("keep-me".into()), &["scope-a".to_string()], at(10, 0));
        assert_eq!(credential.access_token, "new");
        assert_eq!(credential.refresh_token.as_deref(), Some("keep-me"));
        assert_eq!(credential.expires_at, Some(at(11, 0)));
        assert_eq!(credential.issued_at, Some(at(10, 0)));
        assert_eq!(credential.scopes, vec!["scope-a".to_string()]);
    }

    #[test]
    fn short_lived_token_is_fresh_when_minted() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"brief","expires_in":30}"#).unwrap();
        let credential = response.into_credential(None, &[], at(10, 0));
        assert!(!credential.is_expired_at(at(10, 0)));
        assert!(credential.is_expired_at(at(10, 0) + Duration::seconds(15)));
        assert!(credential.is_expired_at(at(10, 1)));
    }

    #[test]
    fn report_row_accepts_fractional_counts() {
        let row: ReportRow = serde_json::from_str(
            r#"{"keys":["/a"],"clicks":5.0,"impressions":100,"ctr":0.05,"position":3.2}"#,
        )
        .unwrap();
        assert_eq!(row.clicks, 5);
        assert_eq!(row.impressions, 100);
        assert_eq!(row.key(), "/a");
    }

    #[test]
    fn query_request_omits_absent_flags() {
        let request = QueryRequest {
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            dimensions: vec!["query".into()],
            row_limit: 10,
            aggregation_type: None,
            search_type: Some("web".into()),
            data_state: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "startDate": "2023-01-01",
                "endDate": "2023-12-31",
                "dimensions": ["query"],
                "rowLimit": 10,
                "type": "web"
            })
        );
    }
}
