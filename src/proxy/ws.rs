use axum::{
    extract::ws::{CloseFrame as ClientCloseFrame, Message as ClientMessage, WebSocket, WebSocketUpgrade},
    http::{
        HeaderMap, HeaderName, Uri,
        header::{AUTHORIZATION, COOKIE, HOST, ORIGIN, USER_AGENT},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream,
    tungstenite::{
        client::IntoClientRequest,
        protocol::{CloseFrame as BackendCloseFrame, Message as BackendMessage, frame::coding::CloseCode},
    },
};

use crate::error::ProxyError;

use super::rules::ProxyRule;

type BackendSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Client headers carried over to the backend handshake. The backend's session
/// check on the feed socket relies on the cookie.
const FORWARDED_HEADERS: [HeaderName; 4] = [COOKIE, AUTHORIZATION, ORIGIN, USER_AGENT];

/// forward
///
/// Opens the backend socket first, so an unreachable backend is reported as
/// `502 Bad Gateway` before the client is upgraded, then upgrades the client and
/// relays frames in both directions.
pub async fn forward(
    upgrade: WebSocketUpgrade,
    rule: &ProxyRule,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<Response, ProxyError> {
    let url = rule.forward_url(uri, true)?;

    let mut request = url.as_str().into_client_request()?;
    for name in FORWARDED_HEADERS {
        for value in headers.get_all(&name) {
            request.headers_mut().append(name.clone(), value.clone());
        }
    }
    if !rule.changes_origin() {
        if let Some(host) = headers.get(HOST) {
            request.headers_mut().insert(HOST, host.clone());
        }
    }

    let (backend, _) = tokio_tungstenite::connect_async(request).await?;
    tracing::info!(target = %url, "websocket connected to backend");

    Ok(upgrade.on_upgrade(move |client| relay(client, backend)))
}

/// Pumps frames until either side closes. Ping and pong stay on their own hop;
/// each side's library answers its peer's pings.
async fn relay(client: WebSocket, backend: BackendSocket) {
    let (mut client_tx, mut client_rx) = client.split();
    let (mut backend_tx, mut backend_rx) = backend.split();

    let upstream = async {
        while let Some(Ok(message)) = client_rx.next().await {
            let closing = matches!(message, ClientMessage::Close(_));
            if let Some(message) = to_backend(message) {
                if backend_tx.send(message).await.is_err() {
                    break;
                }
            }
            if closing {
                break;
            }
        }
        let _ = backend_tx.close().await;
    };

    let downstream = async {
        while let Some(Ok(message)) = backend_rx.next().await {
            let closing = matches!(message, BackendMessage::Close(_));
            if let Some(message) = to_client(message) {
                if client_tx.send(message).await.is_err() {
                    break;
                }
            }
            if closing {
                break;
            }
        }
        let _ = client_tx.close().await;
    };

    tokio::select! {
        _ = upstream => tracing::debug!("client closed websocket"),
        _ = downstream => tracing::debug!("backend closed websocket"),
    }
}

fn to_backend(message: ClientMessage) -> Option<BackendMessage> {
    match message {
        ClientMessage::Text(text) => Some(BackendMessage::Text(text.as_str().to_string().into())),
        ClientMessage::Binary(data) => Some(BackendMessage::Binary(data)),
        ClientMessage::Close(frame) => Some(BackendMessage::Close(frame.map(|frame| {
            BackendCloseFrame {
                code: CloseCode::from(frame.code),
                reason: frame.reason.as_str().to_string().into(),
            }
        }))),
        ClientMessage::Ping(_) | ClientMessage::Pong(_) => None,
    }
}

fn to_client(message: BackendMessage) -> Option<ClientMessage> {
    match message {
        BackendMessage::Text(text) => Some(ClientMessage::Text(text.as_str().to_string().into())),
        BackendMessage::Binary(data) => Some(ClientMessage::Binary(data)),
        BackendMessage::Close(frame) => Some(ClientMessage::Close(frame.map(|frame| {
            ClientCloseFrame {
                code: u16::from(frame.code),
                reason: frame.reason.as_str().to_string().into(),
            }
        }))),
        BackendMessage::Ping(_) | BackendMessage::Pong(_) | BackendMessage::Frame(_) => None,
    }
}
