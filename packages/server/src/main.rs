use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::HeaderValue;
use engine::TraitCatalog;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use server::config::{AppConfig, CorsConfig};
use server::state::AppState;
use server::{build_router, database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;

    let catalog = TraitCatalog::load(&config.assets.traits_dir)
        .context("Failed to load trait catalog")?;
    info!(
        assets = catalog.len(),
        root = %config.assets.traits_dir.display(),
        "Trait catalog loaded"
    );

    std::fs::create_dir_all(&config.assets.generated_dir)
        .context("Failed to create generated-content directory")?;

    let cors = cors_layer(&config.server.cors)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        catalog: Arc::new(catalog),
        config: Arc::new(config),
    };
    let app = build_router(state).layer(cors);

    info!("Agent Avatars API listening at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(config: &CorsConfig) -> anyhow::Result<CorsLayer> {
    let layer = if config.allow_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .allow_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .context("Invalid CORS origin")?;
        CorsLayer::new().allow_origin(origins)
    };

    Ok(layer
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age)))
}
