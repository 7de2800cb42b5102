use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::wizard::ValidationMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub options: OptionsConfig,
    pub paths: PathsConfig,
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Remote option set fetching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Endpoint returning a JSON array of strings
    #[serde(default = "default_options_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in milliseconds (default: 5000)
    #[serde(default = "default_options_timeout")]
    pub timeout_ms: u64,
}

fn default_options_endpoint() -> String {
    "http://localhost:3001/api/colors".to_string()
}

fn default_options_timeout() -> u64 {
    5000
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_options_endpoint(),
            timeout_ms: default_options_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
    /// Validate fields on every change instead of on first submit
    #[serde(default)]
    pub validate_on_change: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to file in TUI mode (false = stderr for debugging)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
        }
    }
}

/// Dev options server (`stepform serve`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Values returned from GET /api/colors
    #[serde(default = "default_server_colors")]
    pub colors: Vec<String>,
    /// Artificial latency before answering, in milliseconds
    #[serde(default)]
    pub delay_ms: u64,
}

fn default_server_port() -> u16 {
    3001
}

fn default_server_colors() -> Vec<String> {
    ["red", "orange", "yellow", "green", "blue", "indigo", "violet"]
        .iter()
        .map(|c| (*c).to_string())
        .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            colors: default_server_colors(),
            delay_ms: 0,
        }
    }
}

impl Config {
    /// Path to the project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(".stepform/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so stepform works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // User config in ~/.config/stepform/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("stepform").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables, e.g. STEPFORM__OPTIONS__ENDPOINT
        builder = builder.add_source(
            config::Environment::with_prefix("STEPFORM")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config to .stepform/config.toml
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::local_config_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create stepform config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(config_path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.paths.state);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }

    pub fn options_timeout(&self) -> Duration {
        Duration::from_millis(self.options.timeout_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.ui.tick_rate_ms)
    }

    pub fn validation_mode(&self) -> ValidationMode {
        if self.ui.validate_on_change {
            ValidationMode::OnChange
        } else {
            ValidationMode::OnSubmit
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            options: OptionsConfig::default(),
            paths: PathsConfig {
                state: ".stepform".to_string(),
            },
            ui: UiConfig {
                tick_rate_ms: 100,
                validate_on_change: false,
            },
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.options.endpoint, "http://localhost:3001/api/colors");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.colors.len(), 7);
        assert_eq!(config.validation_mode(), ValidationMode::OnSubmit);
        assert_eq!(config.options_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_explicit_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[options]
endpoint = "http://127.0.0.1:9000/colors"

[ui]
tick_rate_ms = 50
validate_on_change = true

[server]
colors = ["teal"]
"#,
        )
        .unwrap();

        let config = Config::load(Some(path.to_str().unwrap())).unwrap();

        assert_eq!(config.options.endpoint, "http://127.0.0.1:9000/colors");
        assert_eq!(config.options.timeout_ms, 5000);
        assert_eq!(config.tick_rate(), Duration::from_millis(50));
        assert_eq!(config.validation_mode(), ValidationMode::OnChange);
        assert_eq!(config.server.colors, vec!["teal".to_string()]);
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.paths.state, ".stepform");
    }

    #[test]
    fn test_partial_sections_fill_from_serde_defaults() {
        let config: Config = toml::from_str(
            r#"
[options]
[paths]
state = "/tmp/stepform"
[ui]
tick_rate_ms = 250
"#,
        )
        .unwrap();

        assert_eq!(config.options.endpoint, default_options_endpoint());
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.to_file);
        assert_eq!(config.server.delay_ms, 0);
        assert!(!config.ui.validate_on_change);
    }

    #[test]
    fn test_toml_roundtrip_of_defaults() {
        let toml_str = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.options.endpoint, Config::default().options.endpoint);
        assert_eq!(parsed.server.colors, default_server_colors());
    }

    #[test]
    fn test_saved_config_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.options.endpoint = "http://127.0.0.1:9100/api/sizes".to_string();
        config.ui.validate_on_change = true;
        config.server.colors = vec!["amber".to_string(), "teal".to_string()];

        config.save_to(&path).unwrap();
        let loaded = Config::load(Some(path.to_str().unwrap())).unwrap();

        assert_eq!(loaded.options.endpoint, "http://127.0.0.1:9100/api/sizes");
        assert_eq!(loaded.validation_mode(), ValidationMode::OnChange);
        assert_eq!(loaded.server.colors, config.server.colors);
        assert_eq!(loaded.logging.level, "info");
    }

    #[test]
    fn test_absolute_state_path_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.state = temp_dir.path().to_string_lossy().to_string();

        assert_eq!(config.state_path(), temp_dir.path());
        assert_eq!(config.logs_path(), temp_dir.path().join("logs"));
    }

    #[test]
    fn test_relative_state_path_is_resolved() {
        let config = Config::default();
        assert!(config.state_path().is_absolute());
        assert!(config.state_path().ends_with(".stepform"));
    }
}
