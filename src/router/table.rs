use std::{borrow::Cow, collections::HashMap};

use crate::error::RouteError;

use super::{
    history::History,
    node::{Props, PropsFn, QueryParams, RouteNode, View},
};

/// A flattened route: one node of the declared tree with its full path resolved.
#[derive(Debug, Clone)]
pub struct RouteRecord {
    pub name: &'static str,
    /// Full path relative to the history base, e.g. `/user/settings`.
    pub path: String,
    pub view: View,
    pub props: Option<PropsFn>,
    /// True for the guarded node and all of its descendants.
    pub requires_session: bool,
    pub parent: Option<usize>,
    pub depth: usize,
}

impl RouteRecord {
    /// Names of the props this record declares, found by running its
    /// derivation against an empty query.
    pub fn prop_names(&self) -> Vec<&'static str> {
        self.props
            .map(|derive| derive(&QueryParams::default()).keys().collect())
            .unwrap_or_default()
    }
}

/// The immutable route table.
///
/// Constructed once from the declared tree; construction enforces that names are
/// unique and that every path is made of static segments.
#[derive(Debug, Clone)]
pub struct RouteTable {
    history: History,
    records: Vec<RouteRecord>,
    by_name: HashMap<&'static str, usize>,
}

impl RouteTable {
    pub fn new(history: History, routes: Vec<RouteNode>) -> Result<Self, RouteError> {
        let mut table = Self {
            history,
            records: Vec::new(),
            by_name: HashMap::new(),
        };

        for node in &routes {
            if !node.path.starts_with('/') {
                return Err(RouteError::InvalidPath {
                    name: node.name.to_string(),
                    path: node.path.to_string(),
                });
            }
            table.insert(node, None)?;
        }

        Ok(table)
    }

    fn insert(&mut self, node: &RouteNode, parent: Option<usize>) -> Result<(), RouteError> {
        if node.path.contains([':', '*', '?', '#', '(', ')']) {
            return Err(RouteError::InvalidPath {
                name: node.name.to_string(),
                path: node.path.to_string(),
            });
        }

        let (parent_path, parent_guarded, depth) = match parent {
            Some(idx) => {
                let p = &self.records[idx];
                (p.path.as_str(), p.requires_session, p.depth + 1)
            }
            None => ("/", false, 0),
        };

        let record = RouteRecord {
            name: node.name,
            path: join(parent_path, node.path),
            view: node.view,
            props: node.props,
            requires_session: parent_guarded || node.guarded,
            parent,
            depth,
        };

        if self.by_name.contains_key(node.name) {
            return Err(RouteError::DuplicateName(node.name.to_string()));
        }

        let idx = self.records.len();
        self.by_name.insert(node.name, idx);
        self.records.push(record);

        for child in &node.children {
            self.insert(child, Some(idx))?;
        }
        Ok(())
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Every record, in declaration (depth-first) order.
    pub fn routes(&self) -> &[RouteRecord] {
        &self.records
    }

    pub fn get(&self, name: &str) -> Option<&RouteRecord> {
        self.by_name.get(name).map(|&idx| &self.records[idx])
    }

    /// Resolves a location relative to the history base (`/path?query#hash`).
    ///
    /// Returns the matched chain, root first, or `None` when nothing matches.
    pub fn resolve(&self, location: &str) -> Option<RouteMatch<'_>> {
        let (rest, hash) = match location.split_once('#') {
            Some((rest, hash)) => (rest, Some(hash)),
            None => (location, None),
        };
        let (raw_path, raw_query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        let path = normalize(raw_path);
        let idx = self.best_match(&path)?;

        let mut matched = Vec::with_capacity(self.records[idx].depth + 1);
        let mut cursor = Some(idx);
        while let Some(i) = cursor {
            matched.push(&self.records[i]);
            cursor = self.records[i].parent;
        }
        matched.reverse();

        let mut suffix = String::new();
        if let Some(query) = raw_query.filter(|q| !q.is_empty()) {
            suffix.push('?');
            suffix.push_str(query);
        }
        if let Some(hash) = hash.filter(|h| !h.is_empty()) {
            suffix.push('#');
            suffix.push_str(hash);
        }

        Some(RouteMatch {
            full_path: self.history.href(&format!("{path}{suffix}")),
            path,
            query: raw_query.map(QueryParams::parse).unwrap_or_default(),
            hash: hash.map(str::to_string),
            matched,
        })
    }

    /// Resolves a request URL (path and query as received, base included).
    pub fn resolve_url(&self, url: &str) -> Option<RouteMatch<'_>> {
        let split = url.find(['?', '#']).unwrap_or(url.len());
        let stripped = self.history.strip(&url[..split])?;
        self.resolve(&format!("{stripped}{}", &url[split..]))
    }

    /// Builds the location of a named route under the history base.
    pub fn href(&self, name: &str, query: &[(&str, &str)]) -> Result<String, RouteError> {
        let record = self
            .get(name)
            .ok_or_else(|| RouteError::UnknownName(name.to_string()))?;

        let mut location = record.path.clone();
        if !query.is_empty() {
            let params: QueryParams = query.iter().copied().collect();
            location.push('?');
            location.push_str(&params.to_query_string());
        }
        Ok(self.history.href(&location))
    }

    /// Deepest record whose full path equals `path`, first declared on ties, so
    /// an empty-path default child wins over its parent.
    fn best_match(&self, path: &str) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (idx, record) in self.records.iter().enumerate() {
            if !record.path.eq_ignore_ascii_case(path) {
                continue;
            }
            match best {
                Some(b) if self.records[b].depth >= record.depth => {}
                _ => best = Some(idx),
            }
        }
        best
    }
}

/// The result of resolving a location.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    path: String,
    full_path: String,
    query: QueryParams,
    hash: Option<String>,
    matched: Vec<&'a RouteRecord>,
}

impl<'a> RouteMatch<'a> {
    /// Decoded, normalized path relative to the base.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Location including base, query and hash.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    /// Ancestors first, matched record last.
    pub fn matched(&self) -> &[&'a RouteRecord] {
        &self.matched
    }

    pub fn leaf(&self) -> &'a RouteRecord {
        // A match always holds at least the matched record itself.
        self.matched[self.matched.len() - 1]
    }

    pub fn name(&self) -> &'static str {
        self.leaf().name
    }

    /// Props of the matched record.
    pub fn props(&self) -> Props {
        self.props_for(self.leaf())
    }

    pub fn props_for(&self, record: &RouteRecord) -> Props {
        record
            .props
            .map(|derive| derive(&self.query))
            .unwrap_or_default()
    }

    /// Whether the match sits behind the session boundary. The table itself never
    /// enforces it.
    pub fn requires_session(&self) -> bool {
        self.leaf().requires_session
    }
}

fn join(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return normalize(child);
    }
    if child.is_empty() {
        return parent.to_string();
    }
    normalize(&format!("{}/{}", parent.trim_end_matches('/'), child))
}

/// Percent-decodes each segment, forces a leading slash and drops one trailing
/// slash. An encoded `/` stays encoded and never splits a segment.
fn normalize(path: &str) -> String {
    let decoded = path
        .split('/')
        .map(|segment| {
            let segment = urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment));
            segment.replace('/', "%2F")
        })
        .collect::<Vec<_>>()
        .join("/");
    let mut path = if decoded.starts_with('/') {
        decoded
    } else {
        format!("/{decoded}")
    };
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(component: &'static str) -> View {
        View::lazy(component, component)
    }

    #[test]
    fn join_handles_absolute_relative_and_empty_children() {
        assert_eq!(join("/", ""), "/");
        assert_eq!(join("/", "/confirm"), "/confirm");
        assert_eq!(join("/user", "settings"), "/user/settings");
        assert_eq!(join("/", "about"), "/about");
    }

    #[test]
    fn normalize_decodes_and_trims() {
        assert_eq!(normalize("/user/feeds/"), "/user/feeds");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/feed%2Ddetails"), "/feed-details");
    }

    #[test]
    fn normalize_keeps_encoded_separators_inside_a_segment() {
        assert_eq!(normalize("/user%2Fsettings"), "/user%2Fsettings");
        assert_eq!(normalize("/user%2fsettings"), "/user%2Fsettings");
        assert_eq!(normalize("/user/feed%20list"), "/user/feed list");
    }

    #[test]
    fn rejects_dynamic_segments() {
        let err = RouteTable::new(
            History::default(),
            vec![RouteNode::new("/feed/:id", "Feed", page("Feed"))],
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::InvalidPath { .. }));
    }

    #[test]
    fn rejects_relative_top_level_paths() {
        let err = RouteTable::new(
            History::default(),
            vec![RouteNode::new("feeds", "Feeds", page("Feeds"))],
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::InvalidPath { .. }));
    }

    #[test]
    fn guard_is_inherited() {
        let table = RouteTable::new(
            History::default(),
            vec![
                RouteNode::new("/user", "Shell", page("Shell"))
                    .guarded()
                    .children(vec![RouteNode::new("inbox", "Inbox", page("Inbox"))]),
            ],
        )
        .unwrap();
        assert!(table.get("Inbox").unwrap().requires_session);
    }

    #[test]
    fn first_declared_wins_between_equal_depths() {
        let table = RouteTable::new(
            History::default(),
            vec![
                RouteNode::new("/a", "First", page("First")),
                RouteNode::new("/a", "Second", page("Second")),
            ],
        )
        .unwrap();
        assert_eq!(table.resolve("/a").unwrap().name(), "First");
    }
}
