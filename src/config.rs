//! statrt Configuration
//!
//! Two layers: `ContextConfig`, the snapshot a `Context` is created from, and
//! `StatrtConfig`, the optional `statrt.toml` file the CLI reads.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "statrt.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings a context is created from.
///
/// Copied into the context at creation, so later changes to a config value
/// never affect a running context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Trace every allocation and release, and enable the debugging report
    #[serde(default)]
    pub debugging: bool,

    /// Log per-entry-point timings at info level
    #[serde(default)]
    pub logging: bool,
}

impl ContextConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_debugging(&mut self, flag: bool) -> &mut Self {
        self.debugging = flag;
        self
    }

    pub fn set_logging(&mut self, flag: bool) -> &mut Self {
        self.logging = flag;
        self
    }
}

/// Root configuration structure matching statrt.toml.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatrtConfig {
    /// Context flags
    #[serde(default)]
    pub context: ContextConfig,

    /// Output formatting
    #[serde(default)]
    pub report: ReportConfig,
}

impl StatrtConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: StatrtConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the current directory or parents.
    pub fn load_from_cwd() -> ConfigResult<Self> {
        let cwd = std::env::current_dir().map_err(ConfigError::Io)?;
        Self::find_and_load(&cwd)
    }

    /// Find and load configuration by searching up from the given directory.
    pub fn find_and_load(start_dir: &Path) -> ConfigResult<Self> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return Self::load(&config_path);
            }
            if !dir.pop() {
                return Ok(Self::default());
            }
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Render as TOML text.
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
            .map_err(ConfigError::Io)
    }
}

/// Output formatting for printed statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Digits after the decimal point
    #[serde(default = "default_precision")]
    pub precision: usize,
}

fn default_precision() -> usize {
    6
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StatrtConfig::default();
        assert!(!config.context.debugging);
        assert!(!config.context.logging);
        assert_eq!(config.report.precision, 6);
    }

    #[test]
    fn test_builder_setters() {
        let mut config = ContextConfig::new();
        config.set_debugging(true).set_logging(true);
        assert!(config.debugging);
        assert!(config.logging);
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
[context]
debugging = true

[report]
precision = 3
"#;
        let config: StatrtConfig = toml::from_str(toml_str).unwrap();
        assert!(config.context.debugging);
        assert!(!config.context.logging);
        assert_eq!(config.report.precision, 3);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: StatrtConfig = toml::from_str("").unwrap();
        assert_eq!(config, StatrtConfig::default());
    }

    #[test]
    fn test_save_and_find() {
        let mut dir = std::env::temp_dir();
        dir.push(format!("statrt_config_{}", std::process::id()));
        let nested = dir.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let mut config = StatrtConfig::default();
        config.context.set_logging(true);
        config.report.precision = 2;
        config.save(&dir.join(CONFIG_FILE)).unwrap();

        let found = StatrtConfig::find_and_load(&nested).unwrap();
        assert_eq!(found, config);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file() {
        let path = Path::new("/nonexistent/statrt.toml");
        assert!(matches!(
            StatrtConfig::load(path),
            Err(ConfigError::NotFound(_))
        ));
    }
}
