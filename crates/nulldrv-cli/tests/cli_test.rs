//! Integration test: loader manifest and driver verification
//!
//! Run with: cargo test -p nulldrv-cli --test cli_test

use std::path::Path;

use nulldrv_cli::manifest::{IcdManifest, API_VERSION, FILE_FORMAT_VERSION};
use nulldrv_cli::verify::{has_failures, run_checks, CheckStatus};

#[test]
fn test_manifest_layout() {
    let manifest = IcdManifest::new(Path::new("/opt/nulldrv/libnulldrv_icd.so"));
    let json = manifest.to_json().expect("serialize manifest");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");

    assert_eq!(value["file_format_version"], FILE_FORMAT_VERSION);
    assert_eq!(value["ICD"]["library_path"], "/opt/nulldrv/libnulldrv_icd.so");
    assert_eq!(value["ICD"]["api_version"], API_VERSION);
    assert!(value.get("icd").is_none(), "the ICD key is upper case");
}

#[test]
fn test_manifest_reads_back() {
    let manifest = IcdManifest::new(Path::new("nulldrv_icd.dll"));
    let json = manifest.to_json().expect("serialize manifest");
    let parsed = IcdManifest::from_json(&json).expect("parse manifest");
    assert_eq!(parsed, manifest);
}

#[test]
fn test_manifest_from_loader_json() {
    let json = r#"{
        "file_format_version": "1.0.0",
        "ICD": {
            "library_path": "./libnulldrv_icd.so",
            "api_version": "1.0.0"
        }
    }"#;
    let manifest = IcdManifest::from_json(json).expect("parse manifest");
    assert_eq!(manifest.icd.library_path, "./libnulldrv_icd.so");
}

#[test]
fn test_verify_missing_library_fails() {
    let results = run_checks(Path::new("/nonexistent/libnulldrv_icd.so"));
    assert!(has_failures(&results));

    let library = results
        .iter()
        .find(|r| r.name == "Driver library")
        .expect("library check present");
    assert_eq!(library.status, CheckStatus::Fail);

    for name in ["Interface negotiation", "Entry points", "Smoke sequence"] {
        let check = results
            .iter()
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("{name} check present"));
        assert_eq!(check.status, CheckStatus::Skip, "{name}");
    }
}

#[test]
fn test_verify_results_serialize_lowercase() {
    let results = run_checks(Path::new("/nonexistent/libnulldrv_icd.so"));
    let json = serde_json::to_value(&results).expect("serialize results");
    let statuses: Vec<&str> = json
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|r| r["status"].as_str())
        .collect();
    assert!(statuses.contains(&"fail"));
    assert!(statuses.contains(&"skip"));
}
