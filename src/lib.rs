use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    routing::get,
};
use std::sync::Arc;
use thiserror::Error;
use utoipa::OpenApi;

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Route table engine and the feed reader's declared routes.
pub mod router;
pub mod routes;

// View loading and navigation.
pub mod navigator;
pub mod views;

// Development proxy.
pub mod proxy;

// Dev server surface.
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use navigator::{Navigator, NavigatorPool, ViewCache};
pub use proxy::ProxyRules;
pub use router::RouteTable;
pub use views::{MockViewLoader, StaticDirLoader, ViewLoaderState};

use error::{ProxyError, RouteError};

/// ApiDoc
///
/// OpenAPI document for the dev tooling endpoints, served at
/// `/__routes/openapi.json`. Proxied and client routes are not part of it.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health, handlers::list_routes, handlers::resolve_route,
        handlers::navigate_route, handlers::list_proxy_rules
    ),
    components(
        schemas(
            models::RouteSummary, models::ResolvedRoute, models::NavigationReport,
            models::LoadedView, models::ProxyRuleSummary,
        )
    ),
    tags(
        (name = "rsn2-devserver", description = "RSN2 front-end dev server")
    )
)]
pub struct ApiDoc;

/// Failures while assembling [`AppState`].
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("route table: {0}")]
    Routes(#[from] RouteError),

    #[error("proxy rules: {0}")]
    Proxy(#[from] ProxyError),

    #[error("http client: {0}")]
    Client(#[source] reqwest::Error),
}

/// AppState
///
/// The single, immutable container shared by every request: configuration, the
/// route table, the navigators built on it, the proxy rules and the forwarding
/// client. Everything here is built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub table: Arc<RouteTable>,
    pub navigators: Arc<NavigatorPool>,
    pub proxy: Arc<ProxyRules>,
    pub client: reqwest::Client,
}

impl AppState {
    /// build
    ///
    /// 1. Route table under `config.base_url` (name uniqueness checked here).
    /// 2. View cache, preloading eager views through `loader`. A build output
    ///    without those modules only costs a warning: the proxy and the app shell
    ///    do not need them.
    /// 3. Proxy rules, only in `Env::Local`.
    pub async fn build(config: AppConfig, loader: ViewLoaderState) -> Result<Self, StartupError> {
        let table = Arc::new(routes::route_table(&config.base_url)?);

        let cache = Arc::new(ViewCache::new(loader));
        match cache.preload(&table).await {
            Ok(preloaded) => tracing::info!(preloaded, "eager views preloaded"),
            Err(error) => tracing::warn!(
                error = %error,
                "eager views unavailable, navigation will fetch them on demand"
            ),
        }
        let navigators = Arc::new(NavigatorPool::new(table.clone(), cache));

        let rules = if config.proxy_enabled() {
            ProxyRules::dev_rules(&config.backend_url)?
        } else {
            ProxyRules::disabled()
        };

        let client = proxy::http::client().map_err(StartupError::Client)?;

        tracing::info!(
            routes = table.routes().len(),
            proxy_rules = rules.len(),
            base = %config.base_url,
            "application state assembled"
        );

        Ok(Self {
            config,
            table,
            navigators,
            proxy: Arc::new(rules),
            client,
        })
    }
}

// --- Axum FromRef Extractor Implementations ---

// Lets the read-only route handlers take just the table.
impl FromRef<AppState> for Arc<RouteTable> {
    fn from_ref(app_state: &AppState) -> Arc<RouteTable> {
        app_state.table.clone()
    }
}

/// create_router
///
/// Assembles the dev server: tooling routes first, then the fallback that applies
/// the proxy rules and serves the app.
pub fn create_router(state: AppState) -> Router {
    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .route("/health", get(handlers::health))
        .route("/__routes", get(handlers::list_routes))
        .route("/__routes/resolve", get(handlers::resolve_route))
        .route("/__routes/navigate", get(handlers::navigate_route))
        .route("/__routes/openapi.json", get(handlers::openapi))
        .route("/__proxy", get(handlers::list_proxy_rules))
        // Proxy rules and the app shell.
        .fallback(handlers::dispatch)
        .with_state(state);

    // Request id generation, tracing span, id propagation back to the client.
    base_router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(
                x_request_id.clone(),
                MakeRequestUuid,
            ))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// Builds the span `TraceLayer` opens per request, carrying the `x-request-id`
/// next to method and URI so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
