//! Unit tests for bootstrap configuration and graceful degradation
//!
//! Tests that manipulate ZONECAST_CONFIG are marked with #[serial]
//! so they run sequentially, not in parallel.

use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use zonecast_common::config::{resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use zonecast_common::Error;

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("config.toml");
    let mut file = std::fs::File::create(&path).expect("Failed to create config file");
    file.write_all(content.as_bytes()).expect("Failed to write config file");
    path
}

#[test]
fn test_defaults_match_dashboard_defaults() {
    let config = TomlConfig::default();
    assert_eq!(config.port, 5780);
    assert_eq!(config.remote.base_url, "http://localhost:8000/api/v1");
    assert!(config.remote.token.is_none());
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.playback.announcement_interval_seconds, 300);
    assert_eq!(config.playback.fade_duration_seconds, 3.0);
    assert_eq!(config.playback.background_volume_percent, 20);
    assert_eq!(config.playback.announcement_volume_percent, 100);
}

#[test]
fn test_partial_file_fills_defaults() {
    let config = TomlConfig::from_toml_str(
        r#"
        port = 6000

        [remote]
        base_url = "https://api.example.com/api/v1"
        token = "secret"

        [playback]
        announcement_interval_seconds = 60
        "#,
    )
    .expect("Valid config should parse");

    assert_eq!(config.port, 6000);
    assert_eq!(config.remote.base_url, "https://api.example.com/api/v1");
    assert_eq!(config.remote.token.as_deref(), Some("secret"));
    assert_eq!(config.remote.timeout_secs, 15);
    assert_eq!(config.playback.announcement_interval_seconds, 60);
    assert_eq!(config.playback.fade_duration_seconds, 3.0);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_malformed_file_is_config_error() {
    let result = TomlConfig::from_toml_str("port = \"not a number\"");
    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("Invalid config file")),
        other => panic!("Expected Config error, got {:?}", other),
    }
}

#[test]
fn test_missing_explicit_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    let config = TomlConfig::load(Some(&missing)).expect("Missing file must not be fatal");
    assert_eq!(config.port, TomlConfig::default().port);
}

#[test]
fn test_explicit_file_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "port = 7001\n[logging]\nlevel = \"debug\"\n");

    let config = TomlConfig::load(Some(&path)).unwrap();
    assert_eq!(config.port, 7001);
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_cli_path_takes_precedence_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/zonecast-from-env.toml");

    let resolved = resolve_config_path(Some(Path::new("/tmp/zonecast-from-cli.toml")));
    assert_eq!(resolved, Some(PathBuf::from("/tmp/zonecast-from-cli.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_path_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "port = 7100\n");
    env::set_var(CONFIG_ENV_VAR, &path);

    assert_eq!(resolve_config_path(None), Some(path.clone()));
    let config = TomlConfig::load(None).unwrap();
    assert_eq!(config.port, 7100);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_blank_env_var_is_ignored() {
    env::set_var(CONFIG_ENV_VAR, "   ");

    let resolved = resolve_config_path(None);
    assert_ne!(resolved, Some(PathBuf::from("   ")));

    env::remove_var(CONFIG_ENV_VAR);
}
