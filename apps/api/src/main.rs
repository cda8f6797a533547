use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use career_api::agents::client::HttpAgentClient;
use career_api::agents::trigger::AgentTriggerService;
use career_api::config::Config;
use career_api::db::create_store;
use career_api::routes::build_router;
use career_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("career_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Career API v{}", env!("CARGO_PKG_VERSION"));

    let store = create_store(&config).await?;

    let agent_client = HttpAgentClient::new(config.agent_api_url.clone(), config.agent_timeout)
        .context("Failed to build agent HTTP client")?;
    info!(
        "Agent client initialized ({}, timeout {:?})",
        config.agent_api_url, config.agent_timeout
    );
    let agents = AgentTriggerService::new(store.clone(), Arc::new(agent_client));

    let state = AppState { store, agents };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict CORS origins once the web client domain is fixed
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
