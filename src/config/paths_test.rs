use crate::config::paths::*;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

#[test]
fn test_get_config_dir_ends_with_vikunja_mcp() {
    let path = get_config_dir();
    assert!(path.ends_with(".vikunja-mcp"));
}

#[test]
#[serial]
fn test_default_config_path_is_yaml_in_config_dir() {
    unsafe {
        env::remove_var(CONFIG_PATH_ENV);
    }

    let path = default_config_path();
    assert!(path.ends_with(".vikunja-mcp/config.yaml"));
}

#[test]
#[serial]
fn test_default_config_path_respects_env_var() {
    unsafe {
        env::set_var(CONFIG_PATH_ENV, "/tmp/vikunja-mcp-test/custom.yaml");
    }

    let path = default_config_path();
    assert_eq!(path, PathBuf::from("/tmp/vikunja-mcp-test/custom.yaml"));

    unsafe {
        env::remove_var(CONFIG_PATH_ENV);
    }
}

#[test]
#[serial]
fn test_default_config_path_ignores_empty_env_var() {
    unsafe {
        env::set_var(CONFIG_PATH_ENV, "");
    }

    let path = default_config_path();
    assert!(path.ends_with("config.yaml"));
    assert_ne!(path, PathBuf::from(""));

    unsafe {
        env::remove_var(CONFIG_PATH_ENV);
    }
}
