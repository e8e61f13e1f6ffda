//! User configuration file handling
//!
//! Manages settings from ~/.config/glyphwright/settings.json

use crate::core::settings::{
    APP_NAME, DEFAULT_ADVANCE_WIDTH, DEFAULT_BUDGET_BYTES, DEFAULT_CONVERSION_TIMEOUT,
    DEFAULT_FAMILY_NAME, DEFAULT_INITIAL_EPSILON, DEFAULT_MAX_WORKING_SIDE,
};
use crate::font_source::FontMetrics;
use crate::raster::Threshold;
use crate::vectorize::VectorizeOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// User configuration from ~/.config/glyphwright/settings.json
///
/// These settings override built-in defaults but are overridden by CLI arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFile {
    /// Byte budget for one serialized glyph
    pub budget_bytes: Option<usize>,
    pub timeout_secs: Option<u64>,
    /// "auto" or a luminance cut-off in 0-255
    pub threshold: Option<String>,
    pub initial_epsilon: Option<f64>,
    pub max_working_side: Option<u32>,
    pub family_name: Option<String>,
    pub advance_width: Option<u16>,
}

impl ConfigFile {
    /// Get the path to the user config file
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Get the path to the glyphwright config directory
    pub fn config_dir() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));
        config_dir.join(APP_NAME)
    }

    /// Load configuration from the user config file
    pub fn load() -> Option<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`; missing or unreadable files yield `None`
    pub fn load_from(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    debug!("Loaded user settings from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    warn!("Failed to parse settings.json: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read settings.json: {}", e);
                None
            }
        }
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;

        debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Every setting spelled out at its built-in default
    pub fn with_defaults() -> Self {
        Self {
            budget_bytes: Some(DEFAULT_BUDGET_BYTES),
            timeout_secs: Some(DEFAULT_CONVERSION_TIMEOUT.as_secs()),
            threshold: Some("auto".to_string()),
            initial_epsilon: Some(DEFAULT_INITIAL_EPSILON),
            max_working_side: Some(DEFAULT_MAX_WORKING_SIDE),
            family_name: Some(DEFAULT_FAMILY_NAME.to_string()),
            advance_width: Some(DEFAULT_ADVANCE_WIDTH),
        }
    }

    /// Pipeline options with these settings applied over the defaults
    pub fn vectorize_options(&self) -> VectorizeOptions {
        let mut options = VectorizeOptions::default();
        if let Some(budget) = self.budget_bytes {
            options.budget.max_bytes = budget;
        }
        if let Some(secs) = self.timeout_secs {
            options.timeout = Duration::from_secs(secs);
        }
        if let Some(value) = &self.threshold {
            match Threshold::parse(value) {
                Some(threshold) => options.threshold = threshold,
                None => warn!("Ignoring invalid threshold '{}' in settings.json", value),
            }
        }
        if let Some(epsilon) = self.initial_epsilon {
            options.budget.initial_epsilon = epsilon;
        }
        if let Some(side) = self.max_working_side {
            options.budget.max_working_side = side;
        }
        options
    }

    pub fn family_name(&self) -> &str {
        self.family_name.as_deref().unwrap_or(DEFAULT_FAMILY_NAME)
    }

    pub fn font_metrics(&self) -> FontMetrics {
        let metrics = FontMetrics::default();
        match self.advance_width {
            Some(advance_width) => metrics.with_advance_width(advance_width),
            None => metrics,
        }
    }

    /// Initialize the complete user configuration directory
    ///
    /// This creates:
    /// 1. The ~/.config/glyphwright directory structure
    /// 2. A settings.json file with default values
    /// 3. The logs/ directory used by `--log-file`
    pub fn initialize_config_directory() -> anyhow::Result<()> {
        let config_dir = Self::config_dir();
        fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {:?}", config_dir);

        let logs_dir = crate::logging::logs_dir();
        fs::create_dir_all(&logs_dir)?;
        println!("Created logs directory: {:?}", logs_dir);

        let settings_path = Self::config_path();
        if !settings_path.exists() {
            Self::with_defaults().save_to(&settings_path)?;
            println!("Created settings file: {:?}", settings_path);
        } else {
            println!("Settings file already exists: {:?}", settings_path);
        }

        println!("\nConfiguration initialized successfully!");
        println!("  - Edit settings at: {:?}", settings_path);
        println!("  - Logs are written to: {:?}", logs_dir);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ConfigFile::load_from(&dir.path().join("settings.json")), None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let config = ConfigFile {
            budget_bytes: Some(4096),
            family_name: Some("Stamps".to_string()),
            ..ConfigFile::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(ConfigFile::load_from(&path), Some(config));
    }

    #[test]
    fn test_invalid_json_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ budget_bytes: ").unwrap();
        assert_eq!(ConfigFile::load_from(&path), None);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: ConfigFile = serde_json::from_str(r#"{"timeout_secs": 3}"#).unwrap();
        let options = config.vectorize_options();
        assert_eq!(options.timeout, Duration::from_secs(3));
        assert_eq!(options.budget.max_bytes, DEFAULT_BUDGET_BYTES);
        assert_eq!(config.family_name(), DEFAULT_FAMILY_NAME);
    }

    #[test]
    fn test_settings_override_defaults() {
        let config = ConfigFile {
            threshold: Some("100".to_string()),
            initial_epsilon: Some(0.5),
            max_working_side: Some(64),
            advance_width: Some(1000),
            ..ConfigFile::default()
        };
        let options = config.vectorize_options();
        assert_eq!(options.threshold, Threshold::Fixed(100));
        assert_eq!(options.budget.initial_epsilon, 0.5);
        assert_eq!(options.budget.max_working_side, 64);
        assert_eq!(config.font_metrics().advance_width, 1000);
    }

    #[test]
    fn test_bad_threshold_keeps_default() {
        let config = ConfigFile {
            threshold: Some("dark".to_string()),
            ..ConfigFile::default()
        };
        assert_eq!(config.vectorize_options().threshold, Threshold::Auto);
    }

    #[test]
    fn test_defaults_round_trip_to_default_options() {
        assert_eq!(
            ConfigFile::with_defaults().vectorize_options(),
            VectorizeOptions::default()
        );
    }
}
