use search_console_dashboard::{resolve_config, router, AppState, DashboardVariant};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = resolve_config()?;
    if config.variant == DashboardVariant::Ranking && config.oauth_client.is_none() {
        warn!("no OAuth client configured; set GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET or provide secrets.toml");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(variant = config.variant.as_str(), "starting {}", config.variant.title());
    let app = router(AppState::new(config));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
