mod api;
mod cache;
mod cli;
mod config;
mod errors;
mod forms;
mod models;
mod preview;
mod screens;
mod session;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::ApiClient;
use crate::cache::QueryCache;
use crate::cli::{App, Cli};
use crate::config::Config;
use crate::screens::ScreenContext;
use crate::session::{AuthGate, FileCredentialStore, TerminalRedirect};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first; a bad API_BASE_URL stops here
    let config = Config::from_env()?;

    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("resumeit_admin={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("ResumeIt admin v{}", env!("CARGO_PKG_VERSION"));

    let credentials = Arc::new(FileCredentialStore::open(&config.credentials_path));
    let gate = AuthGate::new();
    let redirect = gate.redirect_hook(Arc::new(TerminalRedirect));
    let client = ApiClient::new(&config, credentials, redirect)?;
    debug!("API base URL: {}", client.base_url());

    // Resolve the stored session before any protected command runs
    if cli.needs_session() {
        gate.check(&client).await;
    }

    let ctx = ScreenContext::new(client, QueryCache::new());
    cli::run(cli, App { gate, ctx }).await
}
