use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vyomtech_api::config::{self, AppConfig, Environment};
use vyomtech_api::services::Services;
use vyomtech_api::{app, is_production, AppState};

#[derive(Parser)]
#[command(name = "vyomtech-api")]
#[command(about = "VyomTech multi-tenant API server")]
#[command(version)]
struct Args {
    #[arg(long, env = "API_PORT", help = "Port to listen on")]
    port: Option<u16>,

    #[arg(long = "env", env = "APP_ENV", value_parser = parse_environment, help = "development, staging or production")]
    environment: Option<Environment>,
}

fn parse_environment(value: &str) -> Result<Environment, String> {
    Environment::parse(value).ok_or_else(|| format!("unknown environment: {value}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so APP_ENV, SECURITY_JWT_SECRET, etc. apply under cargo run
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match args.environment {
        Some(environment) => AppConfig::for_environment(environment).with_env_overrides(),
        None => config::config().clone(),
    };
    if let Some(port) = args.port {
        config.api.port = port;
    }

    tracing::info!("Starting VyomTech API in {:?} mode", config.environment);
    if is_production!(config) {
        if config.security.websocket_origins_permissive() {
            tracing::warn!("websocket origin check accepts any origin; set SECURITY_WEBSOCKET_ORIGINS");
        }
        if config.security.jwt_secret.is_empty() {
            tracing::warn!("SECURITY_JWT_SECRET is not set; every bearer token will be rejected");
        }
    }

    let services = Services::in_memory(&config);
    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let state = AppState::new(config, services);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
