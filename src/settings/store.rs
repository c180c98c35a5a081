use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::settings::types::{KeywordMode, SourceSettings, StudioSettings};

/// Environment variable naming the settings file.
pub const SETTINGS_PATH_VAR: &str = "STUDIO_SETTINGS";

const DEFAULT_SETTINGS_FILE: &str = "studio.json";

/// Value shipped in sample configs; treated the same as no key at all.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_OPENAI_API_KEY_HERE";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid value for {var}: {value}")]
    InvalidOverride { var: &'static str, value: String },
}

/// Loads studio settings from a JSON file and the process environment.
pub struct SettingsStore;

impl SettingsStore {
    /// Path of the settings file: `STUDIO_SETTINGS`, else `studio.json`.
    pub fn default_path() -> PathBuf {
        std::env::var(SETTINGS_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_FILE))
    }

    /// Load settings from a JSON file, returning defaults on a missing file.
    pub fn load(path: &Path) -> Result<StudioSettings, SettingsError> {
        if !path.exists() {
            return Ok(StudioSettings::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` and apply overrides from the real environment.
    pub fn load_with_env(path: &Path) -> Result<StudioSettings, SettingsError> {
        let mut settings = Self::load(path)?;
        Self::apply_overrides(&mut settings, |var| std::env::var(var).ok())?;
        Ok(settings)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_overrides<F>(settings: &mut StudioSettings, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        settings.upstream.api_key = lookup("OPENAI_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty() && key != PLACEHOLDER_API_KEY);

        if let Some(url) = lookup("OPENAI_API_URL") {
            settings.upstream.api_url = url;
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            settings.upstream.model = model;
        }
        if let Some(bind) = lookup("STUDIO_BIND") {
            settings.bind_addr = bind;
        }
        if let Some(mode) = lookup("STUDIO_MODE") {
            settings.mode =
                KeywordMode::from_name(&mode).ok_or(SettingsError::InvalidOverride {
                    var: "STUDIO_MODE",
                    value: mode,
                })?;
        }
        if lookup("DUMMY_CAMERA").is_some_and(|v| v == "1" || v == "true") {
            settings.source = SourceSettings::Dummy;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn load_returns_default_when_file_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nonexistent.json");
        let result = SettingsStore::load(&path).unwrap();
        assert_eq!(result, StudioSettings::default());
    }

    #[test]
    fn load_parses_valid_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("studio.json");
        std::fs::write(&path, r#"{"mode":"flat","bindAddr":"0.0.0.0:8080"}"#).unwrap();

        let result = SettingsStore::load(&path).unwrap();
        assert_eq!(result.mode, KeywordMode::Flat);
        assert_eq!(result.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn load_returns_error_for_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("studio.json");
        std::fs::write(&path, "not valid json!!!").unwrap();

        let result = SettingsStore::load(&path);
        assert!(matches!(result, Err(SettingsError::Parse { .. })));
    }

    #[test]
    fn api_key_comes_from_environment() {
        let mut settings = StudioSettings::default();
        SettingsStore::apply_overrides(&mut settings, env_of(&[("OPENAI_API_KEY", "sk-test")]))
            .unwrap();
        assert_eq!(settings.upstream.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn placeholder_api_key_counts_as_missing() {
        let mut settings = StudioSettings::default();
        SettingsStore::apply_overrides(
            &mut settings,
            env_of(&[("OPENAI_API_KEY", PLACEHOLDER_API_KEY)]),
        )
        .unwrap();
        assert!(settings.upstream.api_key.is_none());
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut settings = StudioSettings::default();
        SettingsStore::apply_overrides(&mut settings, env_of(&[("OPENAI_API_KEY", "  ")]))
            .unwrap();
        assert!(settings.upstream.api_key.is_none());
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut settings = StudioSettings::default();
        SettingsStore::apply_overrides(
            &mut settings,
            env_of(&[
                ("OPENAI_API_URL", "http://127.0.0.1:9/v1/chat/completions"),
                ("OPENAI_MODEL", "gpt-4o-mini"),
                ("STUDIO_BIND", "0.0.0.0:4000"),
                ("STUDIO_MODE", "flat"),
            ]),
        )
        .unwrap();
        assert_eq!(
            settings.upstream.api_url,
            "http://127.0.0.1:9/v1/chat/completions"
        );
        assert_eq!(settings.upstream.model, "gpt-4o-mini");
        assert_eq!(settings.bind_addr, "0.0.0.0:4000");
        assert_eq!(settings.mode, KeywordMode::Flat);
    }

    #[test]
    fn invalid_mode_override_is_rejected() {
        let mut settings = StudioSettings::default();
        let result =
            SettingsStore::apply_overrides(&mut settings, env_of(&[("STUDIO_MODE", "spiral")]));
        assert!(matches!(
            result,
            Err(SettingsError::InvalidOverride {
                var: "STUDIO_MODE",
                ..
            })
        ));
    }

    #[test]
    fn dummy_camera_forces_dummy_source() {
        let mut settings = StudioSettings {
            source: SourceSettings::Still {
                path: "face.png".to_string(),
            },
            ..StudioSettings::default()
        };
        SettingsStore::apply_overrides(&mut settings, env_of(&[("DUMMY_CAMERA", "1")])).unwrap();
        assert_eq!(settings.source, SourceSettings::Dummy);
    }
}
