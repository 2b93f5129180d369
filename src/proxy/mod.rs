//! Development proxy.
//!
//! `rules` decides whether and where a request is forwarded, `http` and `ws` do the
//! forwarding. Only installed when the server runs in `Env::Local`.

pub mod http;
pub mod rules;
pub mod ws;

use axum::{
    extract::{FromRequestParts, Request, ws::WebSocketUpgrade},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};

use crate::error::ProxyError;

pub use rules::{FEED_SOCKET_PATH, ProxyRule, ProxyRules};

/// Forwards a request matched by `rule`. Upgrades go through the WebSocket relay
/// when the rule allows it; everything else is forwarded as plain HTTP.
pub async fn forward(
    client: &reqwest::Client,
    rule: &ProxyRule,
    request: Request,
) -> Result<Response, ProxyError> {
    if rule.is_ws() && is_websocket_upgrade(request.headers()) {
        let (mut parts, _body) = request.into_parts();
        return match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
            Ok(upgrade) => ws::forward(upgrade, rule, &parts.uri, &parts.headers).await,
            Err(rejection) => Ok(rejection.into_response()),
        };
    }

    http::forward(client, rule, request).await
}

pub fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("websocket"))
}
