use blockshift_engine::{DragConfig, DragConfigError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid drag settings in {config_path}: {source}")]
    InvalidDragConfig {
        config_path: PathBuf,
        source: DragConfigError,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the terminal frontend writes its log; defaults to [`Config::default_log_file`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub drag: DragConfig,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config
            .drag
            .validate()
            .map_err(|source| ConfigError::InvalidDragConfig {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the log path
        config.log_file = config
            .log_file
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/blockshift");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn default_log_file() -> PathBuf {
        let state_dir = shellexpand::tilde("~/.local/state/blockshift");
        PathBuf::from(state_dir.as_ref()).join("blockshift.log")
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(Self::default_log_file)
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/blockshift/config.toml"));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.drag, DragConfig::default());
        assert!(config.log_file.is_none());
        assert_eq!(config.log_file(), Config::default_log_file());
    }

    #[test]
    fn test_partial_drag_table_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
[drag]
activation_threshold = 12.5
"#,
        )
        .unwrap();

        assert_eq!(config.drag.activation_threshold, 12.5);
        assert_eq!(config.drag.preview_opacity, 0.5);
        assert_eq!(config.drag.selected_class, "is-selected");
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("BLOCKSHIFT_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$BLOCKSHIFT_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path).unwrap();

        assert_eq!(expanded, PathBuf::from("/test/env/path/subdir"));

        unsafe {
            env::remove_var("BLOCKSHIFT_TEST_VAR");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/config.toml");
        let test_config = Config {
            log_file: Some(PathBuf::from("/tmp/blockshift.log")),
            drag: DragConfig {
                activation_threshold: 4.0,
                ..DragConfig::default()
            },
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config.drag, test_config.drag);
        assert_eq!(loaded_config.log_file, test_config.log_file);
    }

    #[test]
    fn test_log_file_with_tilde_is_expanded_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "log_file = \"~/logs/blockshift.log\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        let log_file = config.log_file().to_string_lossy().into_owned();
        assert!(!log_file.starts_with('~'));
        assert!(log_file.ends_with("logs/blockshift.log"));
    }

    #[test]
    fn test_invalid_drag_settings_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[drag]\npreview_opacity = 3.0\n").unwrap();

        let result = Config::load_from_path(&config_file);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidDragConfig {
                source: DragConfigError::InvalidOpacity(_),
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_file_reports_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "drag = \"not a table\"\n").unwrap();

        assert!(matches!(
            Config::load_from_path(&config_file),
            Err(ConfigError::ConfigParseError { .. })
        ));
    }
}
