//! Integration-level unit tests for the SettingsEngine public API.
//!
//! These exercise default loading, dot-notation edits, persistence and reset
//! through `SettingsEngineTrait`.

use linkflow::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use linkflow::types::errors::SettingsError;
use linkflow::types::settings::{LinkflowSettings, ProjectPolicy};
use tempfile::TempDir;

/// Helper: a SettingsEngine whose config file lives in `dir`.
fn engine_in_temp(dir: &TempDir) -> SettingsEngine {
    let path = dir
        .path()
        .join("settings.json")
        .to_string_lossy()
        .to_string();
    SettingsEngine::new(Some(path))
}

/// Without a config file, `load()` yields the built-in defaults.
#[test]
fn test_load_defaults_when_no_config_file_exists() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let settings = engine.load().unwrap();

    assert_eq!(settings, LinkflowSettings::default());
    assert_eq!(settings.projects, ProjectPolicy::default());
    assert_eq!(settings.projects.stale_after_days, 14);
    assert_eq!(settings.projects.inactive_after_days, 60);
    assert_eq!(settings.triage.default_page_size, 20);
    assert_eq!(settings.log_level, "info");
}

/// A change made through `set_value` is visible to a fresh engine on the same file.
#[test]
fn test_set_value_persists_changes() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();
        engine
            .set_value("projects.stale_after_days", serde_json::json!(7))
            .unwrap();
        engine.set_value("log_level", serde_json::json!("debug")).unwrap();
    }

    let mut reloaded = engine_in_temp(&dir);
    let settings = reloaded.load().unwrap();
    assert_eq!(settings.projects.stale_after_days, 7);
    assert_eq!(settings.log_level, "debug");
}

#[test]
fn test_set_value_unknown_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    let result = engine.set_value("projects.nonexistent", serde_json::json!(1));
    assert!(matches!(result, Err(SettingsError::InvalidKey(_))));

    let result = engine.set_value("log_level.deeper", serde_json::json!(1));
    assert!(matches!(result, Err(SettingsError::InvalidKey(_))));

    let result = engine.set_value("", serde_json::json!(1));
    assert!(matches!(result, Err(SettingsError::InvalidKey(_))));
}

#[test]
fn test_set_value_wrong_type_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    let result = engine.set_value("triage.default_page_size", serde_json::json!("many"));
    assert!(matches!(result, Err(SettingsError::InvalidValue(_))));
    assert_eq!(engine.get_settings().triage.default_page_size, 20);
}

#[test]
fn test_set_value_rejects_non_positive_page_size() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    let result = engine.set_value("triage.default_page_size", serde_json::json!(0));
    assert!(matches!(result, Err(SettingsError::InvalidValue(_))));
}

#[test]
fn test_load_rejects_malformed_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("settings.json"), "{ not json").unwrap();

    let mut engine = engine_in_temp(&dir);
    assert!(matches!(engine.load(), Err(SettingsError::SerializationError(_))));
}

#[test]
fn test_load_rejects_inverted_thresholds_on_disk() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("settings.json"),
        r#"{"projects": {"stale_after_days": 30, "inactive_after_days": 10}}"#,
    )
    .unwrap();

    let mut engine = engine_in_temp(&dir);
    assert!(matches!(engine.load(), Err(SettingsError::InvalidValue(_))));
}

/// `reset()` restores defaults both in memory and on disk.
#[test]
fn test_reset_restores_defaults() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();
    engine
        .set_value("projects.inactive_after_days", serde_json::json!(120))
        .unwrap();

    engine.reset().unwrap();
    assert_eq!(engine.get_settings(), &LinkflowSettings::default());

    let mut reloaded = engine_in_temp(&dir);
    assert_eq!(reloaded.load().unwrap(), LinkflowSettings::default());
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b").join("settings.json");
    let engine = SettingsEngine::new(Some(nested.to_string_lossy().to_string()));

    engine.save().unwrap();
    assert!(nested.exists());
    assert_eq!(engine.get_config_path(), nested.to_string_lossy());
}
