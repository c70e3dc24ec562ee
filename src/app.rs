use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/auth/connect", get(handlers::connect))
        .route("/oauth/callback", get(handlers::oauth_callback))
        .route("/auth/service-account", post(handlers::service_account))
        .route("/auth/sign-out", post(handlers::sign_out))
        .route("/report", post(handlers::report_form))
        .route("/api/session", get(handlers::get_session))
        .route("/api/sites", get(handlers::get_sites))
        .route("/api/report", post(handlers::report_json))
        .with_state(state)
}
