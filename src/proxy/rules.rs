use axum::http::Uri;
use regex::Regex;
use url::Url;

use crate::error::ProxyError;

/// Path of the backend's live unread-article feed socket.
pub const FEED_SOCKET_PATH: &str = "/api/article/feed";

/// One path-pattern-to-backend mapping.
#[derive(Debug, Clone)]
pub struct ProxyRule {
    pattern: Regex,
    target: Url,
    ws: bool,
    change_origin: bool,
}

impl ProxyRule {
    pub fn new(pattern: &str, target: Url) -> Result<Self, ProxyError> {
        let pattern = Regex::new(pattern).map_err(|source| ProxyError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        if !matches!(target.scheme(), "http" | "https" | "ws" | "wss") {
            return Err(ProxyError::UnsupportedScheme(target.to_string()));
        }

        Ok(Self {
            pattern,
            target,
            ws: false,
            change_origin: false,
        })
    }

    /// Forward WebSocket upgrades matching this rule.
    pub fn ws(mut self, ws: bool) -> Self {
        self.ws = ws;
        self
    }

    /// Rewrite the outgoing `Host` header to the target's host.
    pub fn change_origin(mut self, change_origin: bool) -> Self {
        self.change_origin = change_origin;
        self
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn is_ws(&self) -> bool {
        self.ws
    }

    pub fn changes_origin(&self) -> bool {
        self.change_origin
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// `host[:port]` of the target, as sent in a rewritten `Host` header.
    pub fn host_header(&self) -> Option<String> {
        let host = self.target.host_str()?;
        Some(match self.target.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        })
    }

    /// The literal text a `^literal` pattern anchors on, if the pattern is that
    /// simple.
    fn literal_prefix(&self) -> Option<&str> {
        let literal = self.pattern.as_str().strip_prefix('^')?;
        literal
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-'))
            .then_some(literal)
    }

    /// Builds the backend URL for a request.
    ///
    /// The request path and query are kept. A target path is only prepended when
    /// the request path does not already start with it, so a rule targeting
    /// `ws://backend/api/article/feed` forwards `/api/article/feed` unchanged. The
    /// scheme follows the transport: `ws`/`wss` for upgrades, `http`/`https`
    /// otherwise.
    pub fn forward_url(&self, uri: &Uri, websocket: bool) -> Result<Url, ProxyError> {
        let mut url = self.target.clone();

        let request_path = uri.path();
        let target_path = self.target.path().trim_end_matches('/');
        if target_path.is_empty() || request_path.starts_with(target_path) {
            url.set_path(request_path);
        } else {
            url.set_path(&format!("{target_path}{request_path}"));
        }
        url.set_query(uri.query());

        let scheme = match (self.target.scheme(), websocket) {
            ("http", true) | ("ws", true) => "ws",
            ("https", true) | ("wss", true) => "wss",
            ("http", false) | ("ws", false) => "http",
            _ => "https",
        };
        url.set_scheme(scheme)
            .map_err(|_| ProxyError::UnsupportedScheme(self.target.to_string()))?;

        Ok(url)
    }
}

/// Ordered proxy rules. The first rule whose pattern matches wins.
#[derive(Debug, Clone, Default)]
pub struct ProxyRules {
    rules: Vec<ProxyRule>,
}

impl ProxyRules {
    /// Validates the ordering: a rule anchored on a literal prefix may not follow a
    /// rule whose literal prefix already covers it, since it could never match.
    pub fn new(rules: Vec<ProxyRule>) -> Result<Self, ProxyError> {
        for (i, earlier) in rules.iter().enumerate() {
            let Some(covering) = earlier.literal_prefix() else {
                continue;
            };
            for later in &rules[i + 1..] {
                if later
                    .literal_prefix()
                    .is_some_and(|prefix| prefix.starts_with(covering))
                {
                    return Err(ProxyError::ShadowedRule {
                        earlier: earlier.pattern().to_string(),
                        later: later.pattern().to_string(),
                    });
                }
            }
        }
        Ok(Self { rules })
    }

    /// No forwarding at all (production).
    pub fn disabled() -> Self {
        Self::default()
    }

    /// The development rules for a backend origin, most specific first:
    ///
    /// 1. `^/api/article/feed` to the backend's feed socket, WebSocket-capable.
    /// 2. `^/api` to the backend origin over HTTP, `Host` rewritten.
    pub fn dev_rules(backend: &Url) -> Result<Self, ProxyError> {
        let mut feed = backend.clone();
        let ws_scheme = if backend.scheme() == "https" { "wss" } else { "ws" };
        feed.set_scheme(ws_scheme)
            .map_err(|_| ProxyError::UnsupportedScheme(backend.to_string()))?;
        feed.set_path(FEED_SOCKET_PATH);
        feed.set_query(None);

        Self::new(vec![
            ProxyRule::new("^/api/article/feed", feed)?.ws(true),
            ProxyRule::new("^/api", backend.clone())?.change_origin(true),
        ])
    }

    pub fn match_path(&self, path: &str) -> Option<&ProxyRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProxyRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> Url {
        Url::parse("http://localhost:3366").unwrap()
    }

    #[test]
    fn literal_prefix_only_for_plain_anchors() {
        let plain = ProxyRule::new("^/api/article/feed", backend()).unwrap();
        let regex = ProxyRule::new("^/api/(a|b)", backend()).unwrap();
        let unanchored = ProxyRule::new("/api", backend()).unwrap();
        assert_eq!(plain.literal_prefix(), Some("/api/article/feed"));
        assert_eq!(regex.literal_prefix(), None);
        assert_eq!(unanchored.literal_prefix(), None);
    }

    #[test]
    fn host_header_keeps_non_default_port() {
        let rule = ProxyRule::new("^/api", backend()).unwrap();
        assert_eq!(rule.host_header().as_deref(), Some("localhost:3366"));

        let rule = ProxyRule::new("^/api", Url::parse("https://example.org").unwrap()).unwrap();
        assert_eq!(rule.host_header().as_deref(), Some("example.org"));
    }

    #[test]
    fn rejects_non_http_targets() {
        let err = ProxyRule::new("^/api", Url::parse("ftp://localhost").unwrap()).unwrap_err();
        assert!(matches!(err, ProxyError::UnsupportedScheme(_)));
    }
}
