//! Integration test: Configuration utilities
//!
//! Tests the bin_common configuration loading functionality.

use dlmm_rebalance_bot::bin_common::{load_config_from_env, ConfigType, MonitorConfig};
use std::env;

#[test]
fn test_monitor_config_default_path() {
    // Clear env var to test default
    env::remove_var("CONFIG_PATH");

    let config_path = load_config_from_env(ConfigType::Monitor);
    assert_eq!(
        config_path.to_str().unwrap(),
        "config/rebalancer_config.yaml"
    );
}

#[test]
fn test_custom_config_path() {
    let custom = ConfigType::Custom("custom/path.yaml".to_string());
    assert_eq!(custom.default_path(), "custom/path.yaml");
}

#[test]
fn test_config_type_env_var_names() {
    assert_eq!(ConfigType::Monitor.env_var_name(), "CONFIG_PATH");
}

#[test]
fn test_monitor_config_yaml_parsing() {
    let yaml = r#"
pool_address: "PoolAddr111"
initial_bin: 4096
tick_ms: 250
watcher:
  half_width: 15
  debounce_ms: 500
"#;
    let config = MonitorConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.pool_address, "PoolAddr111");
    assert_eq!(config.initial_bin, 4_096);
    assert_eq!(config.tick_ms, 250);
    assert_eq!(config.watcher.half_width, 15);
    assert_eq!(config.watcher.debounce_ms, 500);
    // Unspecified watcher fields fall back to their defaults
    assert_eq!(config.watcher.max_reconnect_attempts, 5);
}

#[test]
fn test_monitor_config_rejects_bad_yaml() {
    assert!(MonitorConfig::from_yaml_str("tick_ms: [not a number]").is_err());
}
