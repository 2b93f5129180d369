use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use crate::{
    navigator::Navigation,
    proxy::ProxyRule,
    router::{RouteMatch, RouteRecord, RouteTable},
};

// --- Route Table Schemas ---

/// RouteSummary
///
/// One flattened entry of the route table, as listed by `GET /__routes`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RouteSummary {
    pub name: String,
    // Full path under the history base.
    pub path: String,
    pub component: String,
    pub module: String,
    // Fetched on first navigation instead of with the initial bundle.
    pub lazy: bool,
    // Props derived from the query string.
    pub props: Vec<String>,
    pub requires_session: bool,
    pub parent: Option<String>,
}

impl RouteSummary {
    pub fn from_record(record: &RouteRecord, table: &RouteTable) -> Self {
        Self {
            name: record.name.to_string(),
            path: table.history().href(&record.path),
            component: record.view.component.to_string(),
            module: record.view.module.to_string(),
            lazy: record.view.is_lazy(),
            props: record.prop_names().into_iter().map(str::to_string).collect(),
            requires_session: record.requires_session,
            parent: record
                .parent
                .map(|idx| table.routes()[idx].name.to_string()),
        }
    }
}

/// ResolvedRoute
///
/// The outcome of resolving one location against the table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ResolvedRoute {
    pub name: String,
    pub path: String,
    pub full_path: String,
    // Route names, root first.
    pub matched: Vec<String>,
    // A declared prop with no matching query parameter is `null`.
    pub props: BTreeMap<String, Option<String>>,
    pub requires_session: bool,
}

impl From<&RouteMatch<'_>> for ResolvedRoute {
    fn from(route: &RouteMatch<'_>) -> Self {
        Self {
            name: route.name().to_string(),
            path: route.path().to_string(),
            full_path: route.full_path().to_string(),
            matched: route
                .matched()
                .iter()
                .map(|record| record.name.to_string())
                .collect(),
            props: route.props().to_map(),
            requires_session: route.requires_session(),
        }
    }
}

/// LoadedView
///
/// A view module fetched (or reused from cache) by a navigation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoadedView {
    pub component: String,
    pub module: String,
    pub size: usize,
}

/// NavigationReport
///
/// Returned by `GET /__routes/navigate`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavigationReport {
    pub path: String,
    pub full_path: String,
    pub matched: Vec<String>,
    pub props: BTreeMap<String, Option<String>>,
    pub requires_session: bool,
    pub views: Vec<LoadedView>,
}

impl From<&Navigation> for NavigationReport {
    fn from(navigation: &Navigation) -> Self {
        Self {
            path: navigation.path.clone(),
            full_path: navigation.full_path.clone(),
            matched: navigation.matched.iter().map(|n| n.to_string()).collect(),
            props: navigation.props.to_map(),
            requires_session: navigation.requires_session,
            views: navigation
                .views
                .iter()
                .map(|view| LoadedView {
                    component: view.component.to_string(),
                    module: view.module.to_string(),
                    size: view.source.len(),
                })
                .collect(),
        }
    }
}

// --- Proxy Schemas ---

/// ProxyRuleSummary
///
/// One installed forwarding rule, in evaluation order.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProxyRuleSummary {
    pub pattern: String,
    pub target: String,
    pub ws: bool,
    pub change_origin: bool,
}

impl From<&ProxyRule> for ProxyRuleSummary {
    fn from(rule: &ProxyRule) -> Self {
        Self {
            pattern: rule.pattern().to_string(),
            target: rule.target().to_string(),
            ws: rule.is_ws(),
            change_origin: rule.changes_origin(),
        }
    }
}

// --- Request Parameters ---

/// LocationQuery
///
/// `?path=` parameter of the resolve endpoint. The location is
/// relative to the history base and may carry its own (encoded) query string.
#[derive(Debug, Deserialize, IntoParams)]
pub struct LocationQuery {
    pub path: String,
}

/// NavigateQuery
///
/// Parameters of the navigate endpoint. `client` names the history the
/// navigation belongs to: navigations of one client supersede each other,
/// navigations of different (or anonymous) clients never do.
#[derive(Debug, Deserialize, IntoParams)]
pub struct NavigateQuery {
    pub path: String,
    pub client: Option<String>,
}
