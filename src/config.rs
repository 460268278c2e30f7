use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub steps: StepsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding progress.json and logs/
    pub state: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to file while playing a tour (false = stderr for debugging)
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

/// Defaults shared by every step of a tour unless the step overrides them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepsConfig {
    /// Label of the action that dismisses a step
    #[serde(default = "default_dismiss_text")]
    pub dismiss_text: String,

    /// Label of the action that skips the rest of the tour
    #[serde(default = "default_skip_text")]
    pub skip_text: String,

    /// Card width in columns, borders included
    #[serde(default = "default_width")]
    pub width: usize,
}

fn default_dismiss_text() -> String {
    "GOT IT".to_string()
}

fn default_skip_text() -> String {
    "SKIP".to_string()
}

fn default_width() -> usize {
    60
}

impl Default for StepsConfig {
    fn default() -> Self {
        Self {
            dismiss_text: default_dismiss_text(),
            skip_text: default_skip_text(),
            width: default_width(),
        }
    }
}

impl Config {
    /// Path to the project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(".tourguide/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so tourguide works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        // User config in ~/.config/tourguide/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tourguide").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Project-local config
        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with TOURGUIDE prefix
        builder = builder.add_source(
            config::Environment::with_prefix("TOURGUIDE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
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

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                state: ".tourguide".to_string(), // Relative to cwd
            },
            logging: LoggingConfig::default(),
            steps: StepsConfig::default(),
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
        assert_eq!(config.paths.state, ".tourguide");
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.to_file);
        assert_eq!(config.steps.dismiss_text, "GOT IT");
        assert_eq!(config.steps.skip_text, "SKIP");
        assert_eq!(config.steps.width, 60);
    }

    #[test]
    fn test_load_explicit_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[steps]\ndismiss_text = \"NEXT\"\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.steps.dismiss_text, "NEXT");
        assert_eq!(config.steps.skip_text, "SKIP");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.paths.state, ".tourguide");
    }

    #[test]
    fn test_state_path_is_absolute() {
        let config = Config::default();
        assert!(config.state_path().is_absolute());
        assert!(config.state_path().ends_with(".tourguide"));
        assert!(config.logs_path().ends_with("logs"));

        let mut absolute = Config::default();
        absolute.paths.state = "/var/lib/tourguide".to_string();
        assert_eq!(absolute.state_path(), PathBuf::from("/var/lib/tourguide"));
    }

    #[test]
    fn test_to_toml_contains_sections() {
        let toml = Config::default().to_toml().unwrap();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[steps]"));
        assert!(toml.contains("dismiss_text = \"GOT IT\""));
    }
}
