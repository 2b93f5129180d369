use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{CONNECTION, CONTENT_LENGTH, HOST},
    },
    response::Response,
};
use futures_util::StreamExt;

use crate::error::ProxyError;

use super::rules::ProxyRule;

/// Largest request body the dev proxy buffers before forwarding.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Builds the client used for forwarding. Redirects are handed back to the browser
/// untouched.
pub fn client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

/// forward
///
/// Forwards a plain HTTP request to the rule's target and streams the backend's
/// response back.
///
/// 1. Target URL: request path and query on the rule's target (`http`/`https`).
/// 2. Headers: hop-by-hop headers dropped; `Host` rewritten when the rule asks.
/// 3. Body: buffered up to [`MAX_BODY_BYTES`] (413 beyond, 400 if the stream breaks).
/// 4. Response: status and end-to-end headers copied, body streamed.
pub async fn forward(
    client: &reqwest::Client,
    rule: &ProxyRule,
    request: Request,
) -> Result<Response, ProxyError> {
    let url = rule.forward_url(request.uri(), false)?;
    let (parts, body) = request.into_parts();

    let body = read_body(&parts.headers, body).await?;

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    headers.remove(CONTENT_LENGTH);
    if rule.changes_origin() {
        if let Some(host) = rule.host_header().and_then(|h| HeaderValue::from_str(&h).ok()) {
            headers.insert(HOST, host);
        }
    }

    tracing::debug!(method = %parts.method, target = %url, "forwarding request");

    let upstream = client
        .request(parts.method, url)
        .headers(headers)
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    let mut response_headers = upstream.headers().clone();
    strip_hop_by_hop(&mut response_headers);

    let mut response = Response::builder()
        .status(status)
        .body(Body::from_stream(upstream.bytes_stream()))?;
    *response.headers_mut() = response_headers;

    Ok(response)
}

/// Buffers a request body of at most [`MAX_BODY_BYTES`].
///
/// A declared or actual size over the limit is [`ProxyError::TooLarge`]; a body
/// stream that breaks off is [`ProxyError::Body`].
async fn read_body(headers: &HeaderMap, body: Body) -> Result<Bytes, ProxyError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    if declared.is_some_and(|len| len > MAX_BODY_BYTES) {
        return Err(ProxyError::TooLarge(MAX_BODY_BYTES));
    }

    let mut stream = body.into_data_stream();
    let mut buffer = Vec::with_capacity(declared.unwrap_or(0));
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ProxyError::Body(e.to_string()))?;
        if buffer.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(ProxyError::TooLarge(MAX_BODY_BYTES));
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buffer))
}

/// Drops hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}
