use std::collections::BTreeMap;

use serde::Serialize;
use url::form_urlencoded;

/// How a view's module reaches the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loading {
    /// Bundled with the initial load.
    Eager,
    /// Fetched the first time a route needing it is navigated to.
    Lazy,
}

/// A reference to a page component and the module that implements it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct View {
    pub component: &'static str,
    /// Module path relative to the front-end root, without extension.
    pub module: &'static str,
    pub loading: Loading,
}

impl View {
    pub const fn eager(component: &'static str, module: &'static str) -> Self {
        Self {
            component,
            module,
            loading: Loading::Eager,
        }
    }

    pub const fn lazy(component: &'static str, module: &'static str) -> Self {
        Self {
            component,
            module,
            loading: Loading::Lazy,
        }
    }

    pub fn is_lazy(&self) -> bool {
        self.loading == Loading::Lazy
    }
}

/// Decoded query parameters of a location, in the order they appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Parses a raw query string (without the leading `?`).
    pub fn parse(query: &str) -> Self {
        Self(form_urlencoded::parse(query.as_bytes()).into_owned().collect())
    }

    /// First value of `key`. Repeated parameters keep their later values in
    /// [`QueryParams::iter`] but props only ever see the first one.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Re-encodes the parameters, `application/x-www-form-urlencoded` style.
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Named inputs handed to a component. A declared prop whose query parameter is
/// missing is kept with no value rather than dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Props(BTreeMap<&'static str, Option<String>>);

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: Option<&str>) -> Self {
        self.0.insert(key, value.map(str::to_string));
        self
    }

    /// Value of `key`, `None` when the prop is absent or was never declared.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_deref())
    }

    pub fn declares(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_map(&self) -> BTreeMap<String, Option<String>> {
        self.0
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Pure mapping from the current query to a component's props.
pub type PropsFn = fn(&QueryParams) -> Props;

/// One entry of the declared navigation tree.
///
/// Built with the chained constructors below; a tree is handed whole to
/// [`crate::router::RouteTable::new`], which validates and flattens it.
#[derive(Debug, Clone)]
pub struct RouteNode {
    pub(crate) path: &'static str,
    pub(crate) name: &'static str,
    pub(crate) view: View,
    pub(crate) props: Option<PropsFn>,
    pub(crate) guarded: bool,
    pub(crate) children: Vec<RouteNode>,
}

impl RouteNode {
    pub fn new(path: &'static str, name: &'static str, view: View) -> Self {
        Self {
            path,
            name,
            view,
            props: None,
            guarded: false,
            children: Vec::new(),
        }
    }

    pub fn props(mut self, derive: PropsFn) -> Self {
        self.props = Some(derive);
        self
    }

    /// Marks this node as the point where a session guard attaches. Every
    /// descendant inherits the mark.
    pub fn guarded(mut self) -> Self {
        self.guarded = true;
        self
    }

    pub fn children(mut self, children: Vec<RouteNode>) -> Self {
        self.children = children;
        self
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn view(&self) -> &View {
        &self.view
    }
}
