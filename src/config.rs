//! Dashboard settings loaded from `dashboard.toml`.
//!
//! Every field has a default, so a missing file (or a file that sets only a
//! few keys) is fine.

use std::path::{Path, PathBuf};

use serde::Deserialize;

const CONFIG_ENV: &str = "EDU_DASHBOARD_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Directory holding the `literacy`, `enrollment` and
    /// `school_performance` tables (`.csv`, `.json` or `.parquet`).
    pub data_dir: PathBuf,
    /// Seed for generated sample data.  Unset draws a fresh seed per run.
    pub seed: Option<u64>,
    pub default_min_students: u32,
    /// Districts shown in each of the top / bottom rankings.
    pub top_n: usize,
    pub window_width: f32,
    pub window_height: f32,
    pub theme: ThemeConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            seed: None,
            default_min_students: 500,
            top_n: 10,
            window_width: 1400.0,
            window_height: 900.0,
            theme: ThemeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    /// `#RRGGBB` accent used for headings and the national trend line.
    pub primary_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            primary_color: "#01411C".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl DashboardConfig {
    /// Load from `$EDU_DASHBOARD_CONFIG`, else `./dashboard.toml`.  Falls back
    /// to defaults when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "data_dir",
                reason: "must not be empty".to_string(),
            });
        }
        if self.top_n == 0 {
            return Err(ConfigError::InvalidValue {
                field: "top_n",
                reason: "must be > 0".to_string(),
            });
        }
        if self.window_width <= 0.0 || self.window_height <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "window_width/window_height",
                reason: "must be > 0".to_string(),
            });
        }
        if self.theme.rgb().is_none() {
            return Err(ConfigError::InvalidValue {
                field: "theme.primary_color",
                reason: format!("'{}' is not a #RRGGBB color", self.theme.primary_color),
            });
        }
        Ok(())
    }
}

impl ThemeConfig {
    /// Parse `primary_color` into RGB components.
    pub fn rgb(&self) -> Option<[u8; 3]> {
        let hex = self.primary_color.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some([channel(0)?, channel(2)?, channel(4)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = DashboardConfig::from_toml("").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_overrides_some_fields() {
        let config = DashboardConfig::from_toml(
            r##"
            data_dir = "/srv/edu"
            seed = 42
            top_n = 5

            [theme]
            primary_color = "#336699"
            "##,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/edu"));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.top_n, 5);
        assert_eq!(config.default_min_students, 500);
        assert_eq!(config.theme.rgb(), Some([0x33, 0x66, 0x99]));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            DashboardConfig::from_toml("colour = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let config = DashboardConfig {
            top_n: 0,
            ..DashboardConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "top_n", .. })
        ));

        let mut config = DashboardConfig::default();
        config.theme.primary_color = "green".into();
        assert!(config.validate().is_err());
    }
}
