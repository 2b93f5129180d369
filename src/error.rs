use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors raised while building or querying the route table.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route name `{0}` is declared more than once")]
    DuplicateName(String),

    #[error("route `{name}` has unsupported path `{path}`")]
    InvalidPath { name: String, path: String },

    #[error("no route named `{0}`")]
    UnknownName(String),
}

/// Errors raised by a view loader.
#[derive(Debug, Error)]
pub enum ViewLoadError {
    #[error("view module `{0}` not found")]
    Missing(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors raised by [`crate::navigator::Navigator`].
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("no route matches `{0}`")]
    NotFound(String),

    #[error("navigation to `{0}` was superseded by a newer navigation")]
    Superseded(String),

    #[error("failed to load view `{component}`: {source}")]
    LoadFailed {
        component: String,
        #[source]
        source: ViewLoadError,
    },
}

impl IntoResponse for NavigationError {
    fn into_response(self) -> Response {
        let status = match &self {
            NavigationError::NotFound(_) => StatusCode::NOT_FOUND,
            NavigationError::Superseded(_) => StatusCode::CONFLICT,
            NavigationError::LoadFailed { .. } => StatusCode::BAD_GATEWAY,
        };
        if status == StatusCode::BAD_GATEWAY {
            tracing::error!(error = %self, "view module load failed");
        }
        (status, self.to_string()).into_response()
    }
}

/// Errors raised while building proxy rules or forwarding a request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid proxy pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("proxy target `{0}` cannot be used for this transport")]
    UnsupportedScheme(String),

    #[error("rule `{later}` is shadowed by the earlier rule `{earlier}`")]
    ShadowedRule { earlier: String, later: String },

    #[error("request body exceeds {0} bytes")]
    TooLarge(usize),

    #[error("request body could not be read: {0}")]
    Body(String),

    #[error("backend request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("backend websocket failed: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("could not build response: {0}")]
    Response(#[from] axum::http::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Body(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) | ProxyError::WebSocket(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!(error = %self, status = %status, "proxy error");
        (status, self.to_string()).into_response()
    }
}
