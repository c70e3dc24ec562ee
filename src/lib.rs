pub mod app;
pub mod client;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod presenter;
pub mod service_account;
pub mod session;
pub mod state;
pub mod storage;
pub mod ui;

#[cfg(test)]
mod testing;

pub use app::router;
pub use config::{resolve_config, AppConfig, DashboardVariant};
pub use state::AppState;
