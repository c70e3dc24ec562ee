use crate::config::DashboardVariant;
use crate::errors::{AppError, AuthError, DashboardError};
use crate::models::{CallbackQuery, ReportForm, ServiceAccountForm, SessionResponse, SiteEntry};
use crate::service_account::ServiceAccountProvider;
use crate::session::{ReportView, Session};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    Form, Json,
};
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let mut session = state.session.lock().await;
    let page = render_index(state.variant(), &session);
    // Errors are shown once.
    session.error = None;
    Html(page)
}

pub async fn connect(State(state): State<AppState>) -> Redirect {
    if state.installed.is_none() {
        return flash(&state, "Google sign-in is not enabled for this dashboard").await;
    }

    let mut session = state.session.lock().await;
    match session.ensure_credential(&state.scopes).await {
        Ok(_) => {
            load_sites(&state, &mut session).await;
            Redirect::to("/")
        }
        Err(AuthError::ConsentRequired { url }) => {
            info!("redirecting to Google consent page");
            Redirect::to(&url)
        }
        Err(err) => {
            warn!("sign-in failed: {err}");
            session.error = Some(err.to_string());
            Redirect::to("/")
        }
    }
}

pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    let Some(provider) = state.installed.clone() else {
        return flash(&state, "Google sign-in is not enabled for this dashboard").await;
    };
    if let Some(error) = query.error {
        return flash(&state, &format!("Authorization was not granted: {error}")).await;
    }
    let Some(code) = query.code.filter(|code| !code.is_empty()) else {
        return flash(&state, "Authorization response is missing its code").await;
    };

    let mut session = state.session.lock().await;
    match provider.complete_consent(&code, &state.scopes).await {
        Ok(credential) => {
            session.credential = Some(credential);
            session.sites = None;
            load_sites(&state, &mut session).await;
        }
        Err(err) => {
            warn!("authorization code exchange failed: {err}");
            session.error = Some(err.to_string());
        }
    }
    Redirect::to("/")
}

pub async fn service_account(
    State(state): State<AppState>,
    Form(form): Form<ServiceAccountForm>,
) -> Redirect {
    if state.variant() != DashboardVariant::PagePerformance {
        return flash(&state, "Service-account keys are not accepted by this dashboard").await;
    }

    let mut session = state.session.lock().await;
    let provider = match ServiceAccountProvider::from_json(
        state.http.clone(),
        &form.key_json,
        &state.config.endpoints.token_uri,
    ) {
        Ok(provider) => provider,
        Err(err) => {
            warn!("rejected service account key: {err}");
            session.sign_out(false);
            session.error = Some(err.to_string());
            return Redirect::to("/");
        }
    };

    let account = provider.client_email().to_string();
    *session = Session::with_provider(Arc::new(provider), Some(account));
    if let Err(err) = session.ensure_credential(&state.scopes).await {
        warn!("service account sign-in failed: {err}");
        session.error = Some(err.to_string());
        return Redirect::to("/");
    }
    load_sites(&state, &mut session).await;
    Redirect::to("/")
}

pub async fn sign_out(State(state): State<AppState>) -> Redirect {
    let mut session = state.session.lock().await;
    session.sign_out(state.variant() == DashboardVariant::Ranking);
    info!("session reset");
    Redirect::to("/")
}

pub async fn report_form(
    State(state): State<AppState>,
    Form(form): Form<ReportForm>,
) -> Redirect {
    let mut session = state.session.lock().await;
    if let Err(err) = run_report(&state, &mut session, &form).await {
        session.fail_report(&err);
    }
    Redirect::to("/")
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = state.session.lock().await;
    Json(SessionResponse {
        variant: state.variant().as_str().to_string(),
        authenticated: session.is_authenticated(),
        expires_at: session.credential.as_ref().and_then(|c| c.expires_at),
        sites: session.site_urls(),
    })
}

pub async fn get_sites(State(state): State<AppState>) -> Result<Json<Vec<SiteEntry>>, AppError> {
    let mut session = state.session.lock().await;
    let sites = session.ensure_sites(&state.client, &state.scopes).await?;
    Ok(Json(sites))
}

pub async fn report_json(
    State(state): State<AppState>,
    Json(form): Json<ReportForm>,
) -> Result<Json<ReportView>, AppError> {
    if form.site_url.trim().is_empty() {
        return Err(AppError::bad_request("site_url must not be empty"));
    }
    let mut session = state.session.lock().await;
    let view = run_report(&state, &mut session, &form).await?;
    Ok(Json(view))
}

async fn run_report(
    state: &AppState,
    session: &mut Session,
    form: &ReportForm,
) -> Result<ReportView, DashboardError> {
    let result = session
        .run_report(
            &state.client,
            state.variant(),
            &state.scopes,
            &form.site_url,
            form.filter.as_deref(),
            today(),
        )
        .await;
    if let Err(err) = &result {
        warn!(site = %form.site_url, "report failed: {err}");
    }
    result
}

async fn load_sites(state: &AppState, session: &mut Session) {
    if let Err(err) = session.ensure_sites(&state.client, &state.scopes).await {
        warn!("listing sites failed: {err}");
        session.error = Some(err.to_string());
    }
}

async fn flash(state: &AppState, message: &str) -> Redirect {
    state.session.lock().await.error = Some(message.to_string());
    Redirect::to("/")
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
