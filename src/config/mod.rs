//! Configuration module for routemark.
//!
//! This module provides configuration management for the route service, including:
//! - Loading settings from files (TOML/JSON)
//! - Environment variable overrides
//! - CLI argument merging
//! - Validation and defaults
//!
//! # Example
//!
//! ```rust,no_run
//! use routemark::config::Settings;
//!
//! // Load from default locations or create with defaults
//! let settings = Settings::default();
//!
//! // Load from a specific file
//! let settings = Settings::from_file("routemark.toml").unwrap();
//!
//! // Override with environment variables
//! let settings = settings.merge_with_env();
//! ```

mod settings;

pub use settings::{CliArgs, ConfigError, EndpointConfig, Settings};
