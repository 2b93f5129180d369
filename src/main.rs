use rsn2_devserver::{
    AppState, StaticDirLoader,
    config::{AppConfig, Env},
    create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point of the dev server: Configuration, Logging, Route Table + Views,
/// Proxy Rules, and the HTTP Server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise debug for this crate and request logs from tower_http.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rsn2_devserver=debug,tower_http=info".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: Pretty print output for human readability.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON lines for log aggregation.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Dev server starting in {:?} mode", config.env);

    // 4. Route Table, View Cache (eager views preloaded when present) and Proxy Rules
    let loader = Arc::new(StaticDirLoader::new(config.static_dir.clone()));
    let listen_addr = config.listen_addr;
    let backend = config.backend_url.clone();
    let proxy_enabled = config.proxy_enabled();

    let app_state = AppState::build(config, loader)
        .await
        .expect("FATAL: Failed to assemble application state. Check BASE_URL and BACKEND_URL.");

    // 5. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(listen_addr)
        .await
        .expect("FATAL: Failed to bind LISTEN_ADDR.");

    tracing::info!("Listening on {}", listen_addr);
    if proxy_enabled {
        tracing::info!("Forwarding /api and /api/article/feed to {}", backend);
    }
    tracing::info!("Route table available at: http://{}/__routes", listen_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: Server terminated unexpectedly.");
}
