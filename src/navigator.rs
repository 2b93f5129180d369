use std::{
    collections::HashMap,
    sync::{Arc, Mutex, RwLock},
};

use tokio::sync::watch;

use crate::{
    error::NavigationError,
    router::{Props, RouteTable, View},
    views::{ViewLoaderState, ViewModule},
};

/// A committed navigation: the resolved route and the modules of every view in
/// its chain, root first.
#[derive(Debug, Clone)]
pub struct Navigation {
    pub path: String,
    pub full_path: String,
    pub matched: Vec<&'static str>,
    pub props: Props,
    pub requires_session: bool,
    pub views: Vec<Arc<ViewModule>>,
}

/// ViewCache
///
/// Fetched view modules, keyed by component. One cache serves every navigator
/// of the process, so a lazy module is fetched once no matter which client asked
/// for it first.
pub struct ViewCache {
    loader: ViewLoaderState,
    modules: RwLock<HashMap<&'static str, Arc<ViewModule>>>,
}

impl ViewCache {
    pub fn new(loader: ViewLoaderState) -> Self {
        Self {
            loader,
            modules: RwLock::new(HashMap::new()),
        }
    }

    /// Fetches every eager view of `table`. Returns how many modules are cached.
    ///
    /// # Errors
    /// [`NavigationError::LoadFailed`] for the first eager view that cannot be fetched.
    pub async fn preload(&self, table: &RouteTable) -> Result<usize, NavigationError> {
        let eager: Vec<View> = table
            .routes()
            .iter()
            .filter(|record| !record.view.is_lazy())
            .map(|record| record.view)
            .collect();

        for view in eager {
            if self.get(view.component).is_some() {
                continue;
            }
            let module = self.fetch(&view).await?;
            self.insert(module);
        }
        Ok(self.len())
    }

    /// Whether the module of `component` has been fetched.
    pub fn is_loaded(&self, component: &str) -> bool {
        self.get(component).is_some()
    }

    pub fn len(&self) -> usize {
        self.modules.read().map(|modules| modules.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, component: &str) -> Option<Arc<ViewModule>> {
        self.modules
            .read()
            .ok()
            .and_then(|modules| modules.get(component).cloned())
    }

    async fn fetch(&self, view: &View) -> Result<ViewModule, NavigationError> {
        self.loader
            .load(view)
            .await
            .map_err(|source| NavigationError::LoadFailed {
                component: view.component.to_string(),
                source,
            })
    }

    fn insert(&self, module: ViewModule) -> Arc<ViewModule> {
        let module = Arc::new(module);
        match self.modules.write() {
            Ok(mut modules) => modules
                .entry(module.component)
                .or_insert_with(|| module.clone())
                .clone(),
            Err(_) => module,
        }
    }
}

/// Navigator
///
/// One client's history. Resolves view modules for a route asynchronously
/// through the shared [`ViewCache`]: lazy views are fetched on the first
/// navigation that needs them.
///
/// Navigations are numbered per navigator. A navigation still waiting on a module
/// when a newer one starts on the same navigator gives up with
/// [`NavigationError::Superseded`], so the last navigation always wins. Other
/// navigators are not affected.
pub struct Navigator {
    table: Arc<RouteTable>,
    cache: Arc<ViewCache>,
    generation: watch::Sender<u64>,
    current: RwLock<Option<String>>,
}

impl Navigator {
    /// Builds a navigator with its own cache and preloads every eager view.
    ///
    /// # Errors
    /// [`NavigationError::LoadFailed`] if an eager view cannot be fetched.
    pub async fn new(
        table: Arc<RouteTable>,
        loader: ViewLoaderState,
    ) -> Result<Self, NavigationError> {
        let cache = Arc::new(ViewCache::new(loader));
        let preloaded = cache.preload(&table).await?;
        tracing::info!(preloaded, "navigator ready, eager views preloaded");
        Ok(Self::with_cache(table, cache))
    }

    /// Builds a navigator on an existing cache. Nothing is fetched here.
    pub fn with_cache(table: Arc<RouteTable>, cache: Arc<ViewCache>) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            table,
            cache,
            generation,
            current: RwLock::new(None),
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn cache(&self) -> &ViewCache {
        &self.cache
    }

    /// Navigates to a location relative to the history base.
    ///
    /// # Errors
    /// - [`NavigationError::NotFound`] when no route matches.
    /// - [`NavigationError::Superseded`] when a newer navigation started first.
    /// - [`NavigationError::LoadFailed`] when a view module cannot be fetched.
    pub async fn navigate(&self, location: &str) -> Result<Navigation, NavigationError> {
        let mut ticket = 0;
        self.generation.send_modify(|generation| {
            *generation += 1;
            ticket = *generation;
        });

        let route = self
            .table
            .resolve(location)
            .ok_or_else(|| NavigationError::NotFound(location.to_string()))?;

        let mut views = Vec::with_capacity(route.matched().len());
        for record in route.matched() {
            views.push(self.load(&record.view, ticket, location).await?);
        }

        if *self.generation.borrow() != ticket {
            return Err(NavigationError::Superseded(location.to_string()));
        }

        if let Ok(mut current) = self.current.write() {
            *current = Some(route.full_path().to_string());
        }

        tracing::debug!(location, route = route.name(), "navigation committed");

        Ok(Navigation {
            path: route.path().to_string(),
            full_path: route.full_path().to_string(),
            matched: route.matched().iter().map(|record| record.name).collect(),
            props: route.props(),
            requires_session: route.requires_session(),
            views,
        })
    }

    /// Whether the module of `component` has been fetched.
    pub fn is_loaded(&self, component: &str) -> bool {
        self.cache.is_loaded(component)
    }

    pub fn loaded_count(&self) -> usize {
        self.cache.len()
    }

    /// Full path of the last committed navigation.
    pub fn current(&self) -> Option<String> {
        self.current.read().ok().and_then(|current| current.clone())
    }

    async fn load(
        &self,
        view: &View,
        ticket: u64,
        location: &str,
    ) -> Result<Arc<ViewModule>, NavigationError> {
        if let Some(module) = self.cache.get(view.component) {
            return Ok(module);
        }

        let mut changes = self.generation.subscribe();
        tokio::select! {
            loaded = self.cache.fetch(view) => Ok(self.cache.insert(loaded?)),
            _ = superseded(&mut changes, ticket) => {
                tracing::debug!(location, component = view.component, "navigation superseded while loading");
                Err(NavigationError::Superseded(location.to_string()))
            }
        }
    }
}

/// Resolves once the generation moves past `ticket`.
async fn superseded(changes: &mut watch::Receiver<u64>, ticket: u64) {
    loop {
        if *changes.borrow_and_update() != ticket {
            return;
        }
        if changes.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// NavigatorPool
///
/// Hands out navigators over one shared [`ViewCache`]. A caller naming a client
/// gets that client's navigator back on every call, so its navigations supersede
/// each other. Anonymous callers get a fresh navigator each time and never
/// cancel anyone.
pub struct NavigatorPool {
    table: Arc<RouteTable>,
    cache: Arc<ViewCache>,
    clients: Mutex<HashMap<String, Arc<Navigator>>>,
}

impl NavigatorPool {
    pub fn new(table: Arc<RouteTable>, cache: Arc<ViewCache>) -> Self {
        Self {
            table,
            cache,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn navigator(&self, client: Option<&str>) -> Arc<Navigator> {
        let Some(client) = client else {
            return Arc::new(self.fresh());
        };

        match self.clients.lock() {
            Ok(mut clients) => clients
                .entry(client.to_string())
                .or_insert_with(|| Arc::new(self.fresh()))
                .clone(),
            Err(_) => Arc::new(self.fresh()),
        }
    }

    pub fn cache(&self) -> &ViewCache {
        &self.cache
    }

    /// Number of named clients seen so far.
    pub fn clients(&self) -> usize {
        self.clients.lock().map(|clients| clients.len()).unwrap_or(0)
    }

    fn fresh(&self) -> Navigator {
        Navigator::with_cache(self.table.clone(), self.cache.clone())
    }
}
