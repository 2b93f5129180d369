use rsn2_devserver::{AppConfig, config::Env};
use serial_test::serial;
use std::{env, panic, path::PathBuf};

// --- Setup/Teardown Utilities ---

const CONFIG_VARS: [&str; 5] = ["APP_ENV", "BASE_URL", "LISTEN_ADDR", "BACKEND_URL", "STATIC_DIR"];

/// Utility to run a test function and restore environment variables afterward
fn run_with_env<T, R>(test: T, cleanup_vars: Vec<&'static str>) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    // Save current environment variables
    let originals: Vec<(String, Option<String>)> = cleanup_vars
        .iter()
        .map(|&var| (var.to_string(), env::var(var).ok()))
        .collect();

    // Run the test
    let result = panic::catch_unwind(test);

    // Restore original environment variables
    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            if let Some(val) = original_value {
                env::set_var(&key, val);
            } else {
                env::remove_var(&key);
            }
        }
    }

    // Re-panic if the test failed
    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

fn clear_config_vars() {
    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_fail_fast() {
    // No STATIC_DIR: production has no dev bundle to fall back to.
    let result = run_with_env(
        || {
            panic::catch_unwind(|| {
                clear_config_vars();
                unsafe {
                    env::set_var("APP_ENV", "production");
                }
                AppConfig::load()
            })
        },
        CONFIG_VARS.to_vec(),
    );

    assert!(
        result.is_err(),
        "Production config loading should panic without STATIC_DIR"
    );
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(
        || {
            clear_config_vars();
            unsafe {
                env::set_var("APP_ENV", "local");
            }
            AppConfig::load()
        },
        CONFIG_VARS.to_vec(),
    );

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.base_url, "/");
    assert_eq!(config.listen_addr.port(), 8080);
    assert_eq!(config.backend_url.as_str(), "http://localhost:3366/");
    assert_eq!(config.static_dir, PathBuf::from("dist"));
    assert!(config.proxy_enabled());
}

#[test]
#[serial]
fn test_app_config_unknown_env_is_local() {
    let config = run_with_env(
        || {
            clear_config_vars();
            unsafe {
                env::set_var("APP_ENV", "staging");
            }
            AppConfig::load()
        },
        CONFIG_VARS.to_vec(),
    );

    assert_eq!(config.env, Env::Local);
}

#[test]
#[serial]
fn test_app_config_production_reads_overrides() {
    let config = run_with_env(
        || {
            clear_config_vars();
            unsafe {
                env::set_var("APP_ENV", "production");
                env::set_var("BASE_URL", "/reader/");
                env::set_var("LISTEN_ADDR", "127.0.0.1:9000");
                env::set_var("STATIC_DIR", "/srv/rsn2");
            }
            AppConfig::load()
        },
        CONFIG_VARS.to_vec(),
    );

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.base_url, "/reader/");
    assert_eq!(config.listen_addr.to_string(), "127.0.0.1:9000");
    assert_eq!(config.static_dir, PathBuf::from("/srv/rsn2"));
    // Production serves the build only, the API lives on the same origin.
    assert!(!config.proxy_enabled());
}

#[test]
#[serial]
fn test_app_config_backend_override() {
    let config = run_with_env(
        || {
            clear_config_vars();
            unsafe {
                env::set_var("BACKEND_URL", "http://10.0.0.5:4000");
            }
            AppConfig::load()
        },
        CONFIG_VARS.to_vec(),
    );

    assert_eq!(config.backend_url.host_str(), Some("10.0.0.5"));
    assert_eq!(config.backend_url.port(), Some(4000));
}

#[test]
#[serial]
fn test_app_config_invalid_backend_url_panics() {
    let result = run_with_env(
        || {
            panic::catch_unwind(|| {
                clear_config_vars();
                unsafe {
                    env::set_var("BACKEND_URL", "not a url");
                }
                AppConfig::load()
            })
        },
        CONFIG_VARS.to_vec(),
    );

    assert!(result.is_err(), "An unparsable BACKEND_URL must stop startup");
}

#[test]
fn test_app_config_default_is_local_test_setup() {
    let config = AppConfig::default();
    assert_eq!(config.env, Env::Local);
    assert_eq!(config.listen_addr.port(), 0);
    assert!(config.proxy_enabled());
}
