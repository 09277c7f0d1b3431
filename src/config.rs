//! Configuration file support.
//!
//! The tuning constants of the viewer core (disambiguation radii, the
//! thumbnail size floor, debounce delays) are exposed here so they can be
//! adjusted per deployment instead of being baked in.

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::annotation::HitTestOptions;
use crate::constants;
use crate::thumbnail::ThumbnailResolver;

/// Log level setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Parse a level name as used on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Viewer configuration that can be exported and imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Version of the configuration file format
    pub version: u32,

    #[serde(default)]
    pub hit_test: HitTestConfig,

    #[serde(default)]
    pub thumbnail: ThumbnailConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Click disambiguation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitTestConfig {
    /// Neighborhood radii tried in order until the best two candidates differ
    #[serde(default = "default_radii")]
    pub radii: Vec<f64>,

    /// Spacing of the sampling grid
    #[serde(default = "default_sample_step")]
    pub sample_step: f64,
}

fn default_radii() -> Vec<f64> {
    constants::hit_test::ESCALATION_RADII.to_vec()
}

fn default_sample_step() -> f64 {
    constants::hit_test::SAMPLE_STEP
}

impl Default for HitTestConfig {
    fn default() -> Self {
        Self {
            radii: default_radii(),
            sample_step: default_sample_step(),
        }
    }
}

/// Thumbnail negotiation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Size floor shared by small-thumbnail requesters
    #[serde(default = "default_min_size")]
    pub min_size: u32,

    /// Height requested when no constraint is given
    #[serde(default = "default_height")]
    pub default_height: u32,
}

fn default_min_size() -> u32 {
    constants::thumbnail::MIN_SIZE
}

fn default_height() -> u32 {
    constants::thumbnail::DEFAULT_HEIGHT
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            min_size: default_min_size(),
            default_height: default_height(),
        }
    }
}

/// Debounce delays for coalesced notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_hover_ms")]
    pub hover_debounce_ms: u64,

    #[serde(default = "default_viewport_ms")]
    pub viewport_debounce_ms: u64,

    #[serde(default = "default_redraw_ms")]
    pub redraw_debounce_ms: u64,
}

fn default_hover_ms() -> u64 {
    constants::timing::HOVER_DEBOUNCE_MS
}

fn default_viewport_ms() -> u64 {
    constants::timing::VIEWPORT_DEBOUNCE_MS
}

fn default_redraw_ms() -> u64 {
    constants::timing::REDRAW_DEBOUNCE_MS
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            hover_debounce_ms: default_hover_ms(),
            viewport_debounce_ms: default_viewport_ms(),
            redraw_debounce_ms: default_redraw_ms(),
        }
    }
}

impl TimingConfig {
    pub fn hover_debounce(&self) -> Duration {
        Duration::from_millis(self.hover_debounce_ms)
    }

    pub fn viewport_debounce(&self) -> Duration {
        Duration::from_millis(self.viewport_debounce_ms)
    }

    pub fn redraw_debounce(&self) -> Duration {
        Duration::from_millis(self.redraw_debounce_ms)
    }
}

impl ViewerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            hit_test: HitTestConfig::default(),
            thumbnail: ThumbnailConfig::default(),
            timing: TimingConfig::default(),
            log_level: LogLevel::default(),
        }
    }

    /// Hit testing options derived from this configuration.
    ///
    /// Non-positive radii and steps are dropped in favor of the defaults.
    pub fn hit_test_options(&self) -> HitTestOptions {
        let mut radii: Vec<f64> = self
            .hit_test
            .radii
            .iter()
            .copied()
            .filter(|r| r.is_finite() && *r > 0.0)
            .collect();
        if radii.is_empty() {
            log::warn!("No usable hit test radii configured, using defaults");
            radii = default_radii();
        }
        let sample_step = if self.hit_test.sample_step.is_finite() && self.hit_test.sample_step > 0.0 {
            self.hit_test.sample_step
        } else {
            default_sample_step()
        };
        HitTestOptions { radii, sample_step }
    }

    /// Thumbnail resolver using the configured floor and default height.
    pub fn thumbnail_resolver(&self) -> ThumbnailResolver {
        ThumbnailResolver::new(self.thumbnail.min_size, self.thumbnail.default_height)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Read configuration from a specific file.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "iiif-view.json"
    }

    /// Get the default config file path for auto-load/save.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("iiif-view").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("iiif-view")
                    .join(Self::default_filename())
            })
        }
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(&path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = ViewerConfig::default();
        assert_eq!(config.hit_test.radii, vec![50.0, 150.0, 500.0]);
        assert_eq!(config.thumbnail.min_size, 120);
        assert_eq!(config.thumbnail.default_height, 120);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = ViewerConfig::from_json(r#"{"version": 1, "thumbnail": {"min_size": 200}}"#).unwrap();
        assert_eq!(config.thumbnail.min_size, 200);
        assert_eq!(config.thumbnail.default_height, 120);
        assert_eq!(config.hit_test, HitTestConfig::default());
        assert_eq!(config.timing.hover_debounce_ms, 10);
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = ViewerConfig::from_json(r#"{"version": 99}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::VersionTooNew {
                file_version: 99,
                supported_version: CONFIG_VERSION
            }
        ));
    }

    #[test]
    fn test_json_round_trip_preserves_tuning() {
        let mut config = ViewerConfig::new();
        config.hit_test.radii = vec![10.0, 20.0];
        config.log_level = LogLevel::Debug;
        let parsed = ViewerConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_radii_fall_back() {
        let mut config = ViewerConfig::new();
        config.hit_test.radii = vec![-1.0, 0.0];
        config.hit_test.sample_step = 0.0;
        let options = config.hit_test_options();
        assert_eq!(options.radii, vec![50.0, 150.0, 500.0]);
        assert_eq!(options.sample_step, 1.0);
    }

    #[test]
    fn test_log_level_names() {
        assert_eq!(LogLevel::from_name("WARN"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_name("verbose"), None);
        assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
    }
}
