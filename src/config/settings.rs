//! Service settings and configuration management.
//!
//! This module provides configuration options for the routemark service,
//! supporting multiple configuration sources with proper precedence.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::geo::{ArrowPlanner, Coordinate, HeadingScale, DEFAULT_ARROW_LAT_OFFSET, DEFAULT_SPACING_METERS};

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML configuration: {0}")]
    TomlParseError(#[from] toml::de::Error),

    /// Failed to serialize TOML configuration.
    #[error("Failed to serialize TOML configuration: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    /// Failed to parse JSON configuration.
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Unsupported file format.
    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

/// A configured route endpoint.
///
/// # Example
///
/// ```rust
/// use routemark::config::EndpointConfig;
///
/// let start = EndpointConfig::new(28.6139, 77.2090).with_label("Start: New Delhi");
/// assert_eq!(start.coordinate().latitude, 28.6139);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Latitude in degrees.
    pub latitude: f64,

    /// Longitude in degrees.
    pub longitude: f64,

    /// Display label for the endpoint pin.
    #[serde(default)]
    pub label: String,
}

impl EndpointConfig {
    /// Creates an unlabeled endpoint.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            label: String::new(),
        }
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Returns the endpoint position.
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        self.coordinate()
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("{} endpoint: {}", name, e)))
    }
}

/// Main service settings.
///
/// # Configuration Precedence
///
/// Settings are applied in the following order (later sources override earlier):
/// 1. Default values
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
/// 4. CLI arguments
///
/// # Example
///
/// ```rust
/// use routemark::config::Settings;
///
/// let settings = Settings::default()
///     .with_spacing(1000.0)
///     .with_api(true, 9000);
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Route start point.
    #[serde(default = "default_start")]
    pub start: EndpointConfig,

    /// Route end point.
    #[serde(default = "default_end")]
    pub end: EndpointConfig,

    /// Distance between direction arrows in meters.
    #[serde(default = "default_spacing_meters")]
    pub spacing_meters: f64,

    /// Latitude nudge applied to every arrow, in degrees.
    #[serde(default = "default_arrow_lat_offset")]
    pub arrow_lat_offset: f64,

    /// Angle conversion for arrow headings.
    #[serde(default)]
    pub heading_scale: HeadingScale,

    /// Interval between periodic route refreshes in milliseconds.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Randomly perturb the endpoints on a timer.
    #[serde(default = "default_jitter_enabled")]
    pub jitter_enabled: bool,

    /// Interval between endpoint perturbations in milliseconds.
    #[serde(default = "default_jitter_interval_ms")]
    pub jitter_interval_ms: u64,

    /// Full width of the perturbation window in degrees.
    #[serde(default = "default_jitter_span_degrees")]
    pub jitter_span_degrees: f64,

    /// Base URL of the OSRM driving route endpoint.
    #[serde(default = "default_osrm_base_url")]
    pub osrm_base_url: String,

    /// Routing request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Enable the HTTP API server.
    #[serde(default = "default_api_enabled")]
    pub api_enabled: bool,

    /// Port for the HTTP API server.
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

// Default value functions for serde
fn default_start() -> EndpointConfig {
    EndpointConfig::new(28.6139, 77.2090).with_label("Start: New Delhi")
}

fn default_end() -> EndpointConfig {
    EndpointConfig::new(28.4595, 77.0266).with_label("End: Gurugram")
}

fn default_spacing_meters() -> f64 {
    DEFAULT_SPACING_METERS
}

fn default_arrow_lat_offset() -> f64 {
    DEFAULT_ARROW_LAT_OFFSET
}

fn default_refresh_interval_ms() -> u64 {
    600_000
}

fn default_jitter_enabled() -> bool {
    true
}

fn default_jitter_interval_ms() -> u64 {
    600_000
}

fn default_jitter_span_degrees() -> f64 {
    0.01
}

fn default_osrm_base_url() -> String {
    "https://router.project-osrm.org/route/v1/driving/".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30000
}

fn default_api_enabled() -> bool {
    true
}

fn default_api_port() -> u16 {
    8088
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: default_end(),
            spacing_meters: default_spacing_meters(),
            arrow_lat_offset: default_arrow_lat_offset(),
            heading_scale: HeadingScale::default(),
            refresh_interval_ms: default_refresh_interval_ms(),
            jitter_enabled: default_jitter_enabled(),
            jitter_interval_ms: default_jitter_interval_ms(),
            jitter_span_degrees: default_jitter_span_degrees(),
            osrm_base_url: default_osrm_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            api_enabled: default_api_enabled(),
            api_port: default_api_port(),
        }
    }
}

/// Parses a boolean environment value ("true"/"1").
fn env_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

impl Settings {
    /// Creates a new Settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads settings from a configuration file.
    ///
    /// Supports both TOML and JSON formats, detected by file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "toml" => Ok(toml::from_str(&content)?),
            "json" => Ok(serde_json::from_str(&content)?),
            ext => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    /// Saves settings to a configuration file.
    ///
    /// The format is determined by the file extension.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let content = match extension.as_str() {
            "toml" => toml::to_string_pretty(self)?,
            "json" => serde_json::to_string_pretty(self)?,
            ext => return Err(ConfigError::UnsupportedFormat(ext.to_string())),
        };

        fs::write(path, content)?;
        Ok(())
    }

    /// Loads settings from environment variables.
    ///
    /// Environment variables are prefixed with `ROUTEMARK_`, for example
    /// `ROUTEMARK_SPACING_METERS`, `ROUTEMARK_START_LAT` or `ROUTEMARK_API_PORT`.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_env_overrides();
        settings
    }

    /// Applies environment variable overrides to current settings.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("ROUTEMARK_START_LAT") {
            if let Ok(lat) = val.parse() {
                self.start.latitude = lat;
            }
        }

        if let Ok(val) = env::var("ROUTEMARK_START_LON") {
            if let Ok(lon) = val.parse() {
                self.start.longitude = lon;
            }
        }

        if let Ok(val) = env::var("ROUTEMARK_END_LAT") {
            if let Ok(lat) = val.parse() {
                self.end.latitude = lat;
            }
        }

        if let Ok(val) = env::var("ROUTEMARK_END_LON") {
            if let Ok(lon) = val.parse() {
                self.end.longitude = lon;
            }
        }

        if let Ok(val) = env::var("ROUTEMARK_SPACING_METERS") {
            if let Ok(spacing) = val.parse() {
                self.spacing_meters = spacing;
            }
        }

        if let Ok(val) = env::var("ROUTEMARK_ARROW_LAT_OFFSET") {
            if let Ok(offset) = val.parse() {
                self.arrow_lat_offset = offset;
            }
        }

        if let Ok(val) = env::var("ROUTEMARK_HEADING_SCALE") {
            if let Ok(scale) = val.parse() {
                self.heading_scale = scale;
            }
        }

        if let Ok(val) = env::var("ROUTEMARK_REFRESH_INTERVAL_MS") {
            if let Ok(interval) = val.parse() {
                self.refresh_interval_ms = interval;
            }
        }

        if let Ok(val) = env::var("ROUTEMARK_JITTER_ENABLED") {
            self.jitter_enabled = env_flag(&val);
        }

        if let Ok(val) = env::var("ROUTEMARK_JITTER_INTERVAL_MS") {
            if let Ok(interval) = val.parse() {
                self.jitter_interval_ms = interval;
            }
        }

        if let Ok(val) = env::var("ROUTEMARK_OSRM_URL") {
            self.osrm_base_url = val;
        }

        if let Ok(val) = env::var("ROUTEMARK_REQUEST_TIMEOUT_MS") {
            if let Ok(timeout) = val.parse() {
                self.request_timeout_ms = timeout;
            }
        }

        if let Ok(val) = env::var("ROUTEMARK_API_ENABLED") {
            self.api_enabled = env_flag(&val);
        }

        if let Ok(val) = env::var("ROUTEMARK_API_PORT") {
            if let Ok(port) = val.parse() {
                self.api_port = port;
            }
        }
    }

    /// Merges current settings with environment variable overrides.
    pub fn merge_with_env(mut self) -> Self {
        self.apply_env_overrides();
        self
    }

    /// Merges settings with CLI arguments.
    ///
    /// # Example
    ///
    /// ```rust
    /// use routemark::config::{CliArgs, Settings};
    ///
    /// let args = CliArgs {
    ///     spacing_meters: Some(1000.0),
    ///     jitter_enabled: Some(false),
    ///     ..Default::default()
    /// };
    ///
    /// let settings = Settings::default().merge_with_args(&args);
    /// assert_eq!(settings.spacing_meters, 1000.0);
    /// assert!(!settings.jitter_enabled);
    /// ```
    pub fn merge_with_args(mut self, args: &CliArgs) -> Self {
        if let Some((lat, lon)) = args.start {
            self.start.latitude = lat;
            self.start.longitude = lon;
        }
        if let Some((lat, lon)) = args.end {
            self.end.latitude = lat;
            self.end.longitude = lon;
        }
        if let Some(spacing) = args.spacing_meters {
            self.spacing_meters = spacing;
        }
        if let Some(scale) = args.heading_scale {
            self.heading_scale = scale;
        }
        if let Some(interval) = args.refresh_interval_ms {
            self.refresh_interval_ms = interval;
        }
        if let Some(jitter) = args.jitter_enabled {
            self.jitter_enabled = jitter;
        }
        if let Some(ref url) = args.osrm_base_url {
            self.osrm_base_url = url.clone();
        }
        if let Some(api_enabled) = args.api_enabled {
            self.api_enabled = api_enabled;
        }
        if let Some(api_port) = args.api_port {
            self.api_port = api_port;
        }

        self
    }

    /// Validates all settings.
    ///
    /// # Errors
    ///
    /// Returns an error if any setting is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.start.validate("Start")?;
        self.end.validate("End")?;

        // Arrow placement
        if !self.spacing_meters.is_finite() || self.spacing_meters <= 0.0 {
            return Err(ConfigError::ValidationError(
                "Arrow spacing must be a positive number of meters".to_string(),
            ));
        }
        if !self.arrow_lat_offset.is_finite() || self.arrow_lat_offset < 0.0 {
            return Err(ConfigError::ValidationError(
                "Arrow latitude offset must be a non-negative number of degrees".to_string(),
            ));
        }

        // Timers
        if self.refresh_interval_ms < 1000 {
            return Err(ConfigError::ValidationError(
                "Refresh interval must be at least 1000ms".to_string(),
            ));
        }
        if self.jitter_enabled && self.jitter_interval_ms < 1000 {
            return Err(ConfigError::ValidationError(
                "Jitter interval must be at least 1000ms".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter_span_degrees) {
            return Err(ConfigError::ValidationError(
                "Jitter span must be between 0 and 1 degree".to_string(),
            ));
        }

        // Routing service
        if self.osrm_base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "OSRM base URL cannot be empty".to_string(),
            ));
        }
        if self.request_timeout_ms < 1000 {
            return Err(ConfigError::ValidationError(
                "Request timeout must be at least 1000ms".to_string(),
            ));
        }
        if self.request_timeout_ms > 300000 {
            return Err(ConfigError::ValidationError(
                "Request timeout cannot exceed 300000ms (5 minutes)".to_string(),
            ));
        }

        // Validate API port
        if self.api_enabled && self.api_port == 0 {
            return Err(ConfigError::ValidationError(
                "API port cannot be 0 when API is enabled".to_string(),
            ));
        }

        Ok(())
    }

    /// Builds the arrow planner described by these settings.
    pub fn arrow_planner(&self) -> ArrowPlanner {
        ArrowPlanner::new(self.spacing_meters)
            .with_lat_offset(self.arrow_lat_offset)
            .with_heading_scale(self.heading_scale)
    }

    // Builder-style methods for convenient configuration

    /// Sets both route endpoints.
    pub fn with_endpoints(mut self, start: EndpointConfig, end: EndpointConfig) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Sets the arrow spacing in meters.
    pub fn with_spacing(mut self, spacing_meters: f64) -> Self {
        self.spacing_meters = spacing_meters;
        self
    }

    /// Sets the heading scale.
    pub fn with_heading_scale(mut self, scale: HeadingScale) -> Self {
        self.heading_scale = scale;
        self
    }

    /// Sets the periodic refresh interval.
    pub fn with_refresh_interval(mut self, interval_ms: u64) -> Self {
        self.refresh_interval_ms = interval_ms;
        self
    }

    /// Enables or disables endpoint jitter.
    pub fn with_jitter(mut self, enabled: bool) -> Self {
        self.jitter_enabled = enabled;
        self
    }

    /// Sets the OSRM base URL.
    pub fn with_osrm_base_url(mut self, url: impl Into<String>) -> Self {
        self.osrm_base_url = url.into();
        self
    }

    /// Enables or disables the API server.
    pub fn with_api(mut self, enabled: bool, port: u16) -> Self {
        self.api_enabled = enabled;
        self.api_port = port;
        self
    }
}

/// CLI argument structure for parsing command line options.
///
/// All fields are optional to allow partial overrides.
#[derive(Debug, Default, Clone)]
pub struct CliArgs {
    /// Start coordinate as (latitude, longitude).
    pub start: Option<(f64, f64)>,
    /// End coordinate as (latitude, longitude).
    pub end: Option<(f64, f64)>,
    /// Arrow spacing in meters.
    pub spacing_meters: Option<f64>,
    /// Heading scale.
    pub heading_scale: Option<HeadingScale>,
    /// Periodic refresh interval in milliseconds.
    pub refresh_interval_ms: Option<u64>,
    /// Enable endpoint jitter.
    pub jitter_enabled: Option<bool>,
    /// OSRM base URL.
    pub osrm_base_url: Option<String>,
    /// Enable API server.
    pub api_enabled: Option<bool>,
    /// API server port.
    pub api_port: Option<u16>,
    /// Configuration file path.
    pub config_file: Option<PathBuf>,
}

impl CliArgs {
    /// Creates an empty CliArgs instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the final settings by applying the full configuration chain.
    ///
    /// 1. Default values
    /// 2. Configuration file (if specified)
    /// 3. Environment variables
    /// 4. CLI arguments (self)
    pub fn load_settings(&self) -> Result<Settings, ConfigError> {
        // Start with defaults or file
        let mut settings = if let Some(ref config_file) = self.config_file {
            Settings::from_file(config_file)?
        } else {
            Settings::default()
        };

        settings = settings.merge_with_env();
        settings = settings.merge_with_args(self);

        settings.validate()?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.start.coordinate(), Coordinate::new(28.6139, 77.2090));
        assert_eq!(settings.end.coordinate(), Coordinate::new(28.4595, 77.0266));
        assert_eq!(settings.spacing_meters, 2500.0);
        assert_eq!(settings.refresh_interval_ms, 600_000);
        assert_eq!(settings.jitter_interval_ms, 600_000);
        assert_eq!(settings.heading_scale, HeadingScale::Degrees);
        assert!(settings.api_enabled);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let settings = Settings::default()
            .with_spacing(500.0)
            .with_heading_scale(HeadingScale::Legacy)
            .with_refresh_interval(5000)
            .with_jitter(false)
            .with_osrm_base_url("http://localhost:5000/route/v1/driving/")
            .with_api(true, 9000);

        assert_eq!(settings.spacing_meters, 500.0);
        assert_eq!(settings.heading_scale, HeadingScale::Legacy);
        assert_eq!(settings.refresh_interval_ms, 5000);
        assert!(!settings.jitter_enabled);
        assert_eq!(settings.api_port, 9000);

        let planner = settings.arrow_planner();
        assert_eq!(planner.spacing_meters, 500.0);
        assert_eq!(planner.heading_scale, HeadingScale::Legacy);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(Settings::default().with_spacing(0.0).validate().is_err());
        assert!(Settings::default().with_spacing(f64::NAN).validate().is_err());
        assert!(Settings::default().with_refresh_interval(10).validate().is_err());
        assert!(Settings::default().with_api(true, 0).validate().is_err());
        assert!(Settings::default().with_api(false, 0).validate().is_ok());
        assert!(Settings::default().with_osrm_base_url("  ").validate().is_err());

        let bad_start = Settings::default()
            .with_endpoints(EndpointConfig::new(95.0, 0.0), EndpointConfig::new(0.0, 0.0));
        assert!(bad_start.validate().is_err());
    }

    #[test]
    fn test_cli_args_merge() {
        let args = CliArgs {
            start: Some((12.97, 77.59)),
            spacing_meters: Some(1200.0),
            api_enabled: Some(false),
            ..Default::default()
        };

        let settings = Settings::default().merge_with_args(&args);

        assert_eq!(settings.start.coordinate(), Coordinate::new(12.97, 77.59));
        assert_eq!(settings.start.label, "Start: New Delhi"); // Label kept
        assert_eq!(settings.end.coordinate(), Coordinate::new(28.4595, 77.0266));
        assert_eq!(settings.spacing_meters, 1200.0);
        assert!(!settings.api_enabled);
    }

    #[test]
    fn test_partial_toml() {
        let toml_str = r#"
            spacing_meters = 1000.0
            heading_scale = "legacy"

            [start]
            latitude = 12.9716
            longitude = 77.5946
            label = "Start: Bengaluru"
        "#;
        let settings: Settings = toml::from_str(toml_str).unwrap();

        assert_eq!(settings.spacing_meters, 1000.0);
        assert_eq!(settings.heading_scale, HeadingScale::Legacy);
        assert_eq!(settings.start.label, "Start: Bengaluru");
        assert_eq!(settings.end.label, "End: Gurugram");
        assert_eq!(settings.api_port, 8088);
    }

    #[test]
    fn test_toml_serialization() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();

        assert_eq!(settings.start, parsed.start);
        assert_eq!(settings.spacing_meters, parsed.spacing_meters);
        assert_eq!(settings.osrm_base_url, parsed.osrm_base_url);
    }

    #[test]
    fn test_json_serialization() {
        let settings = Settings::default();
        let json_str = serde_json::to_string_pretty(&settings).unwrap();
        let parsed: Settings = serde_json::from_str(&json_str).unwrap();

        assert_eq!(settings.end, parsed.end);
        assert_eq!(settings.heading_scale, parsed.heading_scale);
        assert_eq!(settings.api_port, parsed.api_port);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = Settings::default().to_file("settings.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "yaml"));
    }
}
