use std::{env, net::SocketAddr, path::PathBuf};

use url::Url;

/// AppConfig
///
/// Holds the dev server's entire configuration state. The struct is immutable once
/// loaded and is pulled into handlers via `FromRef`, the same way the route table and
/// proxy rules are shared: built once at startup, read for the process lifetime.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. The proxy rules only exist in `Env::Local`.
    pub env: Env,
    // History base path (`BASE_URL`). Every client route is resolved under it.
    pub base_url: String,
    // Address the dev server binds to.
    pub listen_addr: SocketAddr,
    // Backend origin the `/api` rules forward to.
    pub backend_url: Url,
    // Directory holding the built front end (`index.html`, assets, view modules).
    pub static_dir: PathBuf,
}

/// Env
///
/// Defines the runtime context. `Local` installs the dev proxy rules; `Production`
/// serves the built front end only, calling the API on the same origin.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3366";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

impl Default for AppConfig {
    /// default
    ///
    /// Provides a non-panicking AppConfig instance for test setup, without needing
    /// any environment variable to be present.
    fn default() -> Self {
        Self {
            env: Env::Local,
            base_url: "/".to_string(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            backend_url: Url::parse(DEFAULT_BACKEND_URL).expect("static backend url"),
            static_dir: PathBuf::from("dist"),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from environment variables and implements the
    /// **fail-fast** principle.
    ///
    /// # Panics
    /// Panics if `LISTEN_ADDR` or `BACKEND_URL` cannot be parsed, or if `STATIC_DIR`
    /// is missing in production (there is no dev bundle to fall back to there).
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").unwrap_or_else(|_| "local".to_string()).as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let base_url = env::var("BASE_URL").unwrap_or_else(|_| "/".to_string());

        let listen_addr = env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string())
            .parse()
            .expect("FATAL: LISTEN_ADDR must be a socket address (host:port).");

        let backend_url = Url::parse(
            &env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string()),
        )
        .expect("FATAL: BACKEND_URL must be an absolute URL.");

        let static_dir = match env {
            Env::Production => env::var("STATIC_DIR")
                .expect("FATAL: STATIC_DIR must be set in production."),
            Env::Local => env::var("STATIC_DIR").unwrap_or_else(|_| "dist".to_string()),
        };

        Self {
            env,
            base_url,
            listen_addr,
            backend_url,
            static_dir: PathBuf::from(static_dir),
        }
    }

    /// Whether the `/api` forwarding rules are installed. Production builds call the
    /// API on their own origin (or through a reverse proxy outside this crate).
    pub fn proxy_enabled(&self) -> bool {
        self.env == Env::Local
    }
}
