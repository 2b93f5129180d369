use async_trait::async_trait;
use std::{
    collections::{HashMap, HashSet},
    io::ErrorKind,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::{error::ViewLoadError, router::View};

/// ViewModule
///
/// The code behind one page component, as fetched by a [`ViewLoader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModule {
    pub component: &'static str,
    pub module: &'static str,
    pub source: String,
}

// 1. ViewLoader Contract
/// ViewLoader
///
/// Defines how a view module is fetched. This trait allows swapping the concrete
/// source, from the built front end on disk (`StaticDirLoader`) to the in-memory
/// mock (`MockViewLoader`) in tests, without touching the navigator.
#[async_trait]
pub trait ViewLoader: Send + Sync {
    /// Fetches the module implementing `view`.
    async fn load(&self, view: &View) -> Result<ViewModule, ViewLoadError>;
}

// 2. The Real Implementation (built front end)
/// StaticDirLoader
///
/// Reads `<root>/<module>.js` from the front-end build output.
#[derive(Clone, Debug)]
pub struct StaticDirLoader {
    root: PathBuf,
}

impl StaticDirLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn module_path(&self, view: &View) -> PathBuf {
        self.root.join(format!("{}.js", view.module))
    }
}

#[async_trait]
impl ViewLoader for StaticDirLoader {
    async fn load(&self, view: &View) -> Result<ViewModule, ViewLoadError> {
        let path = self.module_path(view);
        let source = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ViewLoadError::Missing(path.display().to_string())
            } else {
                ViewLoadError::Io(e)
            }
        })?;

        tracing::debug!(component = view.component, path = %path.display(), "view module loaded");

        Ok(ViewModule {
            component: view.component,
            module: view.module,
            source,
        })
    }
}

// 3. The Mock Implementation (For Tests)
/// MockViewLoader
///
/// Serves a stub module for every view. Individual components can be slowed down
/// or made to fail, and every fetch is counted so tests can assert how often a
/// module was requested.
#[derive(Default)]
pub struct MockViewLoader {
    delays: HashMap<&'static str, Duration>,
    failing: HashSet<&'static str>,
    loads: Mutex<HashMap<&'static str, usize>>,
}

impl MockViewLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, component: &'static str, delay: Duration) -> Self {
        self.delays.insert(component, delay);
        self
    }

    pub fn failing(mut self, component: &'static str) -> Self {
        self.failing.insert(component);
        self
    }

    /// Number of fetches started for `component`.
    pub fn load_count(&self, component: &str) -> usize {
        self.loads
            .lock()
            .map(|loads| loads.get(component).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_loads(&self) -> usize {
        self.loads
            .lock()
            .map(|loads| loads.values().sum())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ViewLoader for MockViewLoader {
    async fn load(&self, view: &View) -> Result<ViewModule, ViewLoadError> {
        if let Ok(mut loads) = self.loads.lock() {
            *loads.entry(view.component).or_insert(0) += 1;
        }

        if let Some(delay) = self.delays.get(view.component) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing.contains(view.component) {
            return Err(ViewLoadError::Other(format!(
                "Mock View Error: {} unavailable",
                view.component
            )));
        }

        Ok(ViewModule {
            component: view.component,
            module: view.module,
            source: format!("export default {{ name: \"{}\" }};", view.component),
        })
    }
}

/// ViewLoaderState
///
/// The concrete type used to share a view loader across the application state.
pub type ViewLoaderState = Arc<dyn ViewLoader>;
