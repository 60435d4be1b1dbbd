#![allow(clippy::unwrap_used)]
// File-based tests for config and tree loading.

use std::io::Write;

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

use flatbridge_config::{ConfigError, load_config, load_tree};
use flatbridge_core::WritePolicy;

// ── Helpers ─────────────────────────────────────────────────────────

fn file_with(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_explicit_config_file_overrides_defaults() {
    let file = file_with(
        ".toml",
        r#"
service_name = "bench"
write_policy = "surface"
event_capacity = 16

[info]
site = "lab"
"#,
    );

    let config = load_config(Some(file.path())).unwrap();

    assert_eq!(config.service_name.as_deref(), Some("bench"));
    assert_eq!(config.write_policy, WritePolicy::Surface);
    assert_eq!(config.event_capacity, 16);
    assert_eq!(config.info.get("site").map(String::as_str), Some("lab"));

    let bridge = config.to_bridge_config().unwrap();
    assert_eq!(bridge.event_capacity, 16);
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(matches!(
        load_config(Some(&missing)),
        Err(ConfigError::Validation { .. })
    ));
}

#[test]
fn test_invalid_write_policy_is_rejected() {
    let file = file_with(".toml", "write_policy = \"shout\"\n");
    assert!(matches!(
        load_config(Some(file.path())),
        Err(ConfigError::Figment(_))
    ));
}

// ── Tree files ──────────────────────────────────────────────────────

#[test]
fn test_load_toml_tree() {
    let file = file_with(
        ".toml",
        r#"
name = "Supply"

[enums]
Mode = ["OFF", "ON"]

[members]
mode = { kind = "enum", type = "Mode", value = 0 }
voltage = { kind = "quantity", magnitude = 5.0, unit = "volt" }
"#,
    );

    let (root, enums) = load_tree(file.path()).unwrap();

    assert_eq!(root.class_name(), "Supply");
    assert_eq!(root.len(), 2);
    assert_eq!(enums.get("Mode").unwrap().members(), ["OFF", "ON"]);
}

#[test]
fn test_load_json_tree() {
    let file = file_with(
        ".json",
        r#"{"name": "Probe", "members": {"count": 3, "tags": ["a", "b"]}}"#,
    );

    let (root, enums) = load_tree(file.path()).unwrap();

    assert_eq!(root.class_name(), "Probe");
    assert!(enums.is_empty());
}

#[test]
fn test_unknown_extension_is_rejected() {
    let file = file_with(".yaml", "name: Nope\n");
    assert!(matches!(
        load_tree(file.path()),
        Err(ConfigError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_malformed_tree_reports_parse_error() {
    let file = file_with(".json", "{ not json");
    assert!(matches!(load_tree(file.path()), Err(ConfigError::Json(_))));
}
