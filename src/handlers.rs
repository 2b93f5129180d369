use crate::{
    AppState, ApiDoc, RouteTable,
    error::NavigationError,
    models::{LocationQuery, NavigateQuery, NavigationReport, ProxyRuleSummary, ResolvedRoute, RouteSummary},
    proxy,
};
use axum::{
    Json,
    extract::{Query, Request, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};
use utoipa::OpenApi;

// --- Dev Tooling Handlers ---

/// health
///
/// Liveness check for the dev server itself, independent of the backend.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Server is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// list_routes
///
/// Lists every declared route, flattened in declaration order, with its full path
/// under the configured base.
#[utoipa::path(
    get,
    path = "/__routes",
    responses((status = 200, description = "Route table", body = [RouteSummary]))
)]
pub async fn list_routes(State(table): State<Arc<RouteTable>>) -> Json<Vec<RouteSummary>> {
    Json(
        table
            .routes()
            .iter()
            .map(|record| RouteSummary::from_record(record, &table))
            .collect(),
    )
}

/// resolve_route
///
/// Resolves a location against the route table without loading any view.
/// Unmatched locations return 404.
#[utoipa::path(
    get,
    path = "/__routes/resolve",
    params(LocationQuery),
    responses(
        (status = 200, description = "Matched route", body = ResolvedRoute),
        (status = 404, description = "No route matches")
    )
)]
pub async fn resolve_route(
    State(table): State<Arc<RouteTable>>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<ResolvedRoute>, StatusCode> {
    table
        .resolve(&query.path)
        .map(|route| Json(ResolvedRoute::from(&route)))
        .ok_or(StatusCode::NOT_FOUND)
}

/// navigate_route
///
/// Performs a full navigation: resolves the location and fetches every view module
/// of the matched chain, lazy ones on first use.
///
/// Navigations sharing a `client` behave like one browser history: a newer one
/// cancels an older one still loading. Without `client` the navigation stands
/// alone.
///
/// *Errors*: 404 when nothing matches, 409 when a newer navigation of the same
/// client superseded this one while it was loading, 502 when a view module could
/// not be fetched.
#[utoipa::path(
    get,
    path = "/__routes/navigate",
    params(NavigateQuery),
    responses(
        (status = 200, description = "Navigation committed", body = NavigationReport),
        (status = 404, description = "No route matches"),
        (status = 409, description = "Superseded by a newer navigation"),
        (status = 502, description = "View module failed to load")
    )
)]
pub async fn navigate_route(
    State(state): State<AppState>,
    Query(query): Query<NavigateQuery>,
) -> Result<Json<NavigationReport>, NavigationError> {
    let navigator = state.navigators.navigator(query.client.as_deref());
    let navigation = navigator.navigate(&query.path).await?;
    Ok(Json(NavigationReport::from(&navigation)))
}

/// list_proxy_rules
///
/// Lists the installed forwarding rules in evaluation order. Empty in production.
#[utoipa::path(
    get,
    path = "/__proxy",
    responses((status = 200, description = "Proxy rules", body = [ProxyRuleSummary]))
)]
pub async fn list_proxy_rules(State(state): State<AppState>) -> Json<Vec<ProxyRuleSummary>> {
    Json(state.proxy.iter().map(ProxyRuleSummary::from).collect())
}

/// openapi
///
/// Serves the OpenAPI document of the dev tooling endpoints.
pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// --- Fallback ---

/// dispatch
///
/// Every request not claimed by a dev tooling route lands here.
///
/// 1. Proxy rules, in order: the first matching rule forwards the request.
/// 2. Client routes: a `GET`/`HEAD` whose path resolves in the route table gets
///    `index.html`, letting the client-side router take over (history mode).
/// 3. Static assets from the build output, under the history base.
/// 4. Anything else is 404.
pub async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let path = request.uri().path().to_string();

    if let Some(rule) = state.proxy.match_path(&path) {
        return match proxy::forward(&state.client, rule, request).await {
            Ok(response) => response,
            Err(error) => error.into_response(),
        };
    }

    serve_app(&state, request).await
}

async fn serve_app(state: &AppState, mut request: Request) -> Response {
    if !matches!(*request.method(), Method::GET | Method::HEAD) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let location = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    if let Some(route) = state.table.resolve_url(&location) {
        tracing::debug!(route = route.name(), location = %location, "serving app shell");
        let index = state.config.static_dir.join("index.html");
        return into_response(ServeFile::new(index).oneshot(request).await);
    }

    let Some(asset) = state
        .table
        .history()
        .strip(request.uri().path())
        .and_then(|path| path.parse::<Uri>().ok())
    else {
        return StatusCode::NOT_FOUND.into_response();
    };
    *request.uri_mut() = asset;

    into_response(
        ServeDir::new(&state.config.static_dir)
            .oneshot(request)
            .await,
    )
}

fn into_response<R: IntoResponse>(result: Result<R, std::convert::Infallible>) -> Response {
    match result {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
