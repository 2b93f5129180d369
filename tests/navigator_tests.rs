use rsn2_devserver::{
    MockViewLoader, Navigator, NavigatorPool, StaticDirLoader, ViewCache,
    error::{NavigationError, ViewLoadError},
    router::View,
    routes::route_table,
    views::ViewLoader,
};
use std::{sync::Arc, time::Duration};

async fn navigator_with(loader: Arc<MockViewLoader>) -> Navigator {
    let table = Arc::new(route_table("/").unwrap());
    match Navigator::new(table, loader).await {
        Ok(navigator) => navigator,
        Err(e) => panic!("navigator should build: {e}"),
    }
}

// --- Preloading ---

#[tokio::test]
async fn test_eager_views_are_preloaded() {
    let loader = Arc::new(MockViewLoader::new());
    let navigator = navigator_with(loader.clone()).await;

    assert!(navigator.is_loaded("PublicHeaders"));
    assert!(navigator.is_loaded("Login"));
    assert!(!navigator.is_loaded("NewUser"));
    assert!(!navigator.is_loaded("PrivateHeaders"));
    assert_eq!(loader.total_loads(), 2);
}

#[tokio::test]
async fn test_root_navigation_needs_no_fetch() {
    let loader = Arc::new(MockViewLoader::new());
    let navigator = navigator_with(loader.clone()).await;

    let navigation = navigator.navigate("/").await.unwrap();
    assert_eq!(navigation.matched, vec!["PublicHeaders", "Login"]);
    assert_eq!(navigation.views.len(), 2);
    assert_eq!(loader.total_loads(), 2);
}

#[tokio::test]
async fn test_eager_preload_failure_stops_startup() {
    let loader = Arc::new(MockViewLoader::new().failing("Login"));
    let table = Arc::new(route_table("/").unwrap());

    let Err(err) = Navigator::new(table, loader).await else {
        panic!("a failing eager view must abort startup");
    };
    assert!(matches!(err, NavigationError::LoadFailed { component, .. } if component == "Login"));
}

// --- Lazy Loading ---

#[tokio::test]
async fn test_lazy_view_is_fetched_once() {
    let loader = Arc::new(MockViewLoader::new());
    let navigator = navigator_with(loader.clone()).await;

    let first = navigator.navigate("/user/feeds").await.unwrap();
    assert_eq!(first.matched, vec!["PrivateHeaders", "FeedList"]);
    assert!(first.requires_session);
    assert!(navigator.is_loaded("FeedList"));

    navigator.navigate("/user/feeds").await.unwrap();
    navigator.navigate("/user/unread").await.unwrap();

    assert_eq!(loader.load_count("FeedList"), 1);
    assert_eq!(loader.load_count("PrivateHeaders"), 1);
    assert_eq!(loader.load_count("Unread"), 1);
}

#[tokio::test]
async fn test_navigation_carries_props() {
    let navigator = navigator_with(Arc::new(MockViewLoader::new())).await;

    let navigation = navigator.navigate("/user/feed-details?id=42").await.unwrap();
    assert_eq!(navigation.props.get("id"), Some("42"));
    assert_eq!(navigation.full_path, "/user/feed-details?id=42");
    assert_eq!(navigator.current().as_deref(), Some("/user/feed-details?id=42"));
}

#[tokio::test]
async fn test_load_failure_is_reported_and_not_cached() {
    let loader = Arc::new(MockViewLoader::new().failing("Logout"));
    let navigator = navigator_with(loader.clone()).await;

    let err = navigator.navigate("/user/logout").await.unwrap_err();
    match err {
        NavigationError::LoadFailed { component, source } => {
            assert_eq!(component, "Logout");
            assert!(matches!(source, ViewLoadError::Other(_)));
        }
        other => panic!("expected LoadFailed, got {other:?}"),
    }
    assert!(!navigator.is_loaded("Logout"));
    assert_eq!(navigator.current(), None);

    // A later navigation fetches again.
    let _ = navigator.navigate("/user/logout").await;
    assert_eq!(loader.load_count("Logout"), 2);
}

#[tokio::test]
async fn test_unknown_location_is_not_found() {
    let loader = Arc::new(MockViewLoader::new());
    let navigator = navigator_with(loader.clone()).await;

    let err = navigator.navigate("/feed-details?id=42").await.unwrap_err();
    assert!(matches!(err, NavigationError::NotFound(_)));
    assert_eq!(loader.total_loads(), 2);
}

// --- Concurrent Navigations ---

#[tokio::test]
async fn test_newer_navigation_supersedes_slow_one() {
    let loader = Arc::new(
        MockViewLoader::new().with_delay("FeedList", Duration::from_millis(300)),
    );
    let navigator = Arc::new(navigator_with(loader.clone()).await);

    let slow = {
        let navigator = navigator.clone();
        tokio::spawn(async move { navigator.navigate("/user/feeds").await })
    };

    // Let the slow navigation reach the FeedList fetch.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let fast = navigator.navigate("/user/unread").await.unwrap();
    let slow = slow.await.unwrap();

    assert!(matches!(slow, Err(NavigationError::Superseded(_))));
    assert_eq!(fast.matched, vec!["PrivateHeaders", "Unread"]);
    assert_eq!(navigator.current().as_deref(), Some("/user/unread"));
    // The abandoned fetch is not kept.
    assert!(!navigator.is_loaded("FeedList"));
}

#[tokio::test]
async fn test_sequential_navigations_do_not_interfere() {
    let navigator = navigator_with(Arc::new(MockViewLoader::new())).await;

    navigator.navigate("/newuser").await.unwrap();
    navigator.navigate("/forgotpass").await.unwrap();

    assert_eq!(navigator.current().as_deref(), Some("/forgotpass"));
}

// --- Shared Cache, Separate Histories ---

async fn pool_with(loader: Arc<MockViewLoader>) -> NavigatorPool {
    let table = Arc::new(route_table("/").unwrap());
    let cache = Arc::new(ViewCache::new(loader));
    cache.preload(&table).await.unwrap();
    NavigatorPool::new(table, cache)
}

#[tokio::test]
async fn test_other_navigator_does_not_supersede() {
    let loader = Arc::new(
        MockViewLoader::new().with_delay("FeedList", Duration::from_millis(300)),
    );
    let pool = pool_with(loader.clone()).await;
    let first = pool.navigator(Some("tab-1"));
    let second = pool.navigator(Some("tab-2"));

    let slow = tokio::spawn(async move { first.navigate("/user/feeds").await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    second.navigate("/user/unread").await.unwrap();

    let slow = slow.await.unwrap().expect("another client's navigation must not cancel it");
    assert_eq!(slow.matched, vec!["PrivateHeaders", "FeedList"]);
    assert_eq!(second.current().as_deref(), Some("/user/unread"));
}

#[tokio::test]
async fn test_pool_reuses_named_navigators_only() {
    let pool = pool_with(Arc::new(MockViewLoader::new())).await;

    let a = pool.navigator(Some("tab-1"));
    let b = pool.navigator(Some("tab-1"));
    let c = pool.navigator(Some("tab-2"));
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));

    let anonymous = pool.navigator(None);
    assert!(!Arc::ptr_eq(&anonymous, &pool.navigator(None)));
    assert_eq!(pool.clients(), 2);

    a.navigate("/newuser").await.unwrap();
    assert_eq!(b.current().as_deref(), Some("/newuser"));
    assert_eq!(c.current(), None);
}

#[tokio::test]
async fn test_modules_are_fetched_once_across_navigators() {
    let loader = Arc::new(MockViewLoader::new());
    let pool = pool_with(loader.clone()).await;

    pool.navigator(Some("tab-1")).navigate("/user/feeds").await.unwrap();
    pool.navigator(Some("tab-2")).navigate("/user/feeds").await.unwrap();
    pool.navigator(None).navigate("/user/feeds").await.unwrap();

    assert_eq!(loader.load_count("FeedList"), 1);
    assert!(pool.cache().is_loaded("FeedList"));
}

#[tokio::test]
async fn test_cache_preload_reports_missing_eager_view() {
    let loader = Arc::new(MockViewLoader::new().failing("PublicHeaders"));
    let table = Arc::new(route_table("/").unwrap());
    let cache = ViewCache::new(loader);

    let err = cache.preload(&table).await.unwrap_err();
    assert!(matches!(err, NavigationError::LoadFailed { component, .. } if component == "PublicHeaders"));
    assert!(cache.is_empty());
}

// --- Static Directory Loader ---

#[tokio::test]
async fn test_static_dir_loader_reads_built_modules() {
    let dir = tempfile::tempdir().unwrap();
    let public = dir.path().join("views/public");
    std::fs::create_dir_all(&public).unwrap();
    std::fs::write(dir.path().join("views/PublicHeaders.js"), "export default 'headers';").unwrap();
    std::fs::write(public.join("Login.js"), "export default 'login';").unwrap();

    let loader = StaticDirLoader::new(dir.path());
    let module = loader
        .load(&View::eager("Login", "views/public/Login"))
        .await
        .unwrap();
    assert_eq!(module.component, "Login");
    assert_eq!(module.source, "export default 'login';");

    let err = loader
        .load(&View::lazy("NewUser", "views/public/NewUser"))
        .await
        .unwrap_err();
    assert!(matches!(err, ViewLoadError::Missing(path) if path.ends_with("NewUser.js")));

    // Both eager modules exist, so the navigator can start on this directory.
    let table = Arc::new(route_table("/").unwrap());
    let navigator = Navigator::new(table, Arc::new(loader)).await;
    assert!(navigator.is_ok());
}
