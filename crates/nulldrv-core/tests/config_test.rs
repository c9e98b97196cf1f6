//! Integration test: NulldrvConfig
//!
//! Parses, validates and renders nulldrv.toml without touching the
//! driver itself.
//!
//! Run with: cargo test -p nulldrv-core --test config_test

use std::path::Path;

use nulldrv_core::{CoreError, NulldrvConfig};

#[test]
fn test_defaults() {
    let config = NulldrvConfig::default();
    assert_eq!(config.logging.filter, "off");
    assert_eq!(config.device.name, "nulldrv");
    assert_eq!(config.device.vendor_id, 0);
    assert_eq!(config.swapchain.image_count, 2);
    assert_eq!(config.faults.fail_allocation_after, None);
}

#[test]
fn test_empty_file_is_all_defaults() {
    let config = NulldrvConfig::from_toml_str("").unwrap();
    assert_eq!(config, NulldrvConfig::default());
}

#[test]
fn test_partial_sections() {
    let config = NulldrvConfig::from_toml_str(
        r#"
        [device]
        name = "null-test"
        vendor_id = 4318

        [faults]
        fail_allocation_after = 3
        "#,
    )
    .unwrap();

    assert_eq!(config.device.name, "null-test");
    assert_eq!(config.device.vendor_id, 4318);
    assert_eq!(config.device.device_id, 0);
    assert_eq!(config.swapchain.image_count, 2);
    assert_eq!(config.faults.fail_allocation_after, Some(3));
}

#[test]
fn test_zero_swapchain_images_rejected() {
    let result = NulldrvConfig::from_toml_str("[swapchain]\nimage_count = 0\n");
    match result {
        Err(CoreError::ConfigError(msg)) => assert!(msg.contains("image_count")),
        other => panic!("expected ConfigError, got {:?}", other),
    }
}

#[test]
fn test_malformed_toml_is_parse_error() {
    match NulldrvConfig::from_toml_str("[device\nname = 1") {
        Err(CoreError::Parse(_)) => {}
        other => panic!("expected Parse error, got {:?}", other),
    }
}

#[test]
fn test_render_round_trips() {
    let mut config = NulldrvConfig::default();
    config.swapchain.image_count = 3;
    let text = config.to_toml_string().unwrap();
    assert!(text.contains("image_count = 3"));
    assert_eq!(NulldrvConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn test_missing_file_is_not_an_error() {
    let path = Path::new("/nonexistent/nulldrv/nulldrv.toml");
    assert!(NulldrvConfig::load_optional(path).unwrap().is_none());
}
