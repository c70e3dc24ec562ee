//! In-process stand-in for the Google token endpoint and Search Console API.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct MockState {
    pub sites: Value,
    pub query_response: Value,
    pub query_status: StatusCode,
    pub token_forms: Mutex<Vec<HashMap<String, String>>>,
    pub queries: Mutex<Vec<(String, Value)>>,
    pub api_calls: Mutex<usize>,
}

pub struct MockGoogle {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockGoogle {
    pub fn token_uri(&self) -> String {
        format!("{}/token", self.base_url)
    }

    pub fn token_forms(&self) -> Vec<HashMap<String, String>> {
        self.state.token_forms.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<(String, Value)> {
        self.state.queries.lock().unwrap().clone()
    }

    pub fn api_calls(&self) -> usize {
        *self.state.api_calls.lock().unwrap()
    }
}

pub async fn spawn(sites: Value, query_response: Value) -> MockGoogle {
    spawn_with_query_status(sites, query_response, StatusCode::OK).await
}

/// Like [`spawn`], but authorized queries answer with `query_status`.
pub async fn spawn_with_query_status(
    sites: Value,
    query_response: Value,
    query_status: StatusCode,
) -> MockGoogle {
    let state = Arc::new(MockState {
        sites,
        query_response,
        query_status,
        ..MockState::default()
    });

    let app = Router::new()
        .route("/token", post(token))
        .route("/sites", get(sites_list))
        .route("/sites/:site/searchAnalytics/query", post(query))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    MockGoogle {
        base_url: format!("http://{addr}"),
        state,
    }
}

async fn token(
    State(state): State<Arc<MockState>>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let grant = form.get("grant_type").cloned().unwrap_or_default();
    let rejected = form.get("code").is_some_and(|code| code == "bad-code")
        || form.get("refresh_token").is_some_and(|token| token == "revoked");
    state.token_forms.lock().unwrap().push(form);

    if rejected {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant" })),
        );
    }

    let mut body = json!({
        "access_token": format!("mock-{grant}"),
        "expires_in": 3600,
        "token_type": "Bearer"
    });
    if grant == "authorization_code" {
        body["refresh_token"] = json!("mock-refresh");
    }
    (StatusCode::OK, Json(body))
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("Bearer "))
}

async fn sites_list(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    *state.api_calls.lock().unwrap() += 1;
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    (StatusCode::OK, Json(state.sites.clone()))
}

async fn query(
    State(state): State<Arc<MockState>>,
    Path(site): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    *state.api_calls.lock().unwrap() += 1;
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "code": 401, "message": "Request had invalid authentication credentials." } })),
        );
    }
    state.queries.lock().unwrap().push((site, body));
    (state.query_status, Json(state.query_response.clone()))
}
