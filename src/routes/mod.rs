//! Route Table Index
//!
//! The feed reader's navigation tree, split by access partition. The two top-level
//! nodes are the only partitions; nothing private is declared outside `/user`.

use crate::{
    error::RouteError,
    router::{History, RouteNode, RouteTable},
};

/// Pages reachable without a session, mounted at `/`.
pub mod public;

/// Pages for a signed-in user, mounted at `/user`.
pub mod private;

/// The declared tree, public partition first.
pub fn feed_reader_routes() -> Vec<RouteNode> {
    vec![public::public_routes(), private::private_routes()]
}

/// Builds the feed reader's route table under `base` (the `BASE_URL` history base).
pub fn route_table(base: &str) -> Result<RouteTable, RouteError> {
    RouteTable::new(History::new(base), feed_reader_routes())
}
