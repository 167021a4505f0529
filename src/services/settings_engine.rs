// Linkflow Settings Engine
// Loads, saves and edits settings stored as a JSON file, by default under the
// platform config directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::errors::SettingsError;
use crate::types::settings::LinkflowSettings;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<LinkflowSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &LinkflowSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Default location of the settings file: `<config dir>/linkflow/settings.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("linkflow")
        .join("settings.json")
}

/// Rejects threshold combinations that cannot yield three status bands.
fn validate(settings: &LinkflowSettings) -> Result<(), SettingsError> {
    let policy = &settings.projects;
    if policy.stale_after_days <= 0 {
        return Err(SettingsError::InvalidValue(format!(
            "projects.stale_after_days must be positive, got {}",
            policy.stale_after_days
        )));
    }
    if policy.inactive_after_days <= policy.stale_after_days {
        return Err(SettingsError::InvalidValue(format!(
            "projects.inactive_after_days ({}) must exceed projects.stale_after_days ({})",
            policy.inactive_after_days, policy.stale_after_days
        )));
    }
    if settings.triage.default_page_size <= 0 {
        return Err(SettingsError::InvalidValue(format!(
            "triage.default_page_size must be positive, got {}",
            settings.triage.default_page_size
        )));
    }
    Ok(())
}

/// Settings engine implementation that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: LinkflowSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise, uses [`default_config_path`].
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override
            .unwrap_or_else(|| default_config_path().to_string_lossy().to_string());

        Self {
            config_path,
            settings: LinkflowSettings::default(),
        }
    }

    /// Creates an engine holding `settings` in memory. Nothing is read from disk.
    pub fn with_settings(path: String, settings: LinkflowSettings) -> Self {
        Self {
            config_path: path,
            settings,
        }
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// A missing file yields defaults; a malformed one is an error. Missing
    /// keys fall back to their defaults.
    fn load(&mut self) -> Result<LinkflowSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            self.settings = LinkflowSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        let settings: LinkflowSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        validate(&settings)?;

        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Saves the current settings, creating parent directories as needed.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &LinkflowSettings {
        &self.settings
    }

    /// Updates an individual setting by dot-notation key path and saves.
    ///
    /// The edited JSON is deserialized back into `LinkflowSettings`, so a value
    /// of the wrong type is rejected and nothing changes.
    ///
    /// # Examples
    /// - `"projects.stale_after_days"` → updates `settings.projects.stale_after_days`
    /// - `"log_level"` → updates `settings.log_level`
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }
        let parts: Vec<&str> = key.split('.').collect();

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        {
            let mut current = &mut json_value;
            for (i, part) in parts.iter().enumerate() {
                let map = match current {
                    serde_json::Value::Object(map) => map,
                    _ => {
                        return Err(SettingsError::InvalidKey(format!(
                            "Cannot navigate to key '{}': intermediate value is not an object",
                            key
                        )));
                    }
                };
                if !map.contains_key(*part) {
                    return Err(SettingsError::InvalidKey(format!(
                        "Key '{}' not found in settings",
                        key
                    )));
                }
                if i == parts.len() - 1 {
                    map.insert(part.to_string(), value.clone());
                    break;
                }
                current = match map.get_mut(*part) {
                    Some(v) => v,
                    None => {
                        return Err(SettingsError::InvalidKey(format!(
                            "Key '{}' not found in settings",
                            key
                        )));
                    }
                };
            }
        }

        let new_settings: LinkflowSettings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;
        validate(&new_settings)?;

        self.settings = new_settings;
        self.save()?;

        Ok(())
    }

    /// Resets all settings to defaults and saves to disk.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = LinkflowSettings::default();
        self.save()?;
        Ok(())
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
