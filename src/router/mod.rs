//! Route table engine.
//!
//! `node` holds the declarative building blocks, `table` flattens a tree into an
//! immutable, name-indexed table and resolves locations against it, `history`
//! relocates everything under the configured base path.

pub mod history;
pub mod node;
pub mod table;

pub use history::History;
pub use node::{Loading, Props, PropsFn, QueryParams, RouteNode, View};
pub use table::{RouteMatch, RouteRecord, RouteTable};
