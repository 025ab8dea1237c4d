//! Observability setup for the segmentation binary.
//!
//! This module provides:
//! - Structured logging with configurable levels and formats
//! - Environment-specific configuration support
//!
//! Metrics are recorded through the `metrics` facade by the pipeline; the
//! embedding application decides whether to install a recorder.

use std::env;

use anyhow::Result;
use tracing_subscriber::prelude::*;

/// Observability configuration for different environments
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Environment name (development, staging, production)
    pub environment: String,
    /// Log level for the segmentation crate
    pub log_level: String,
    /// Force a log format (`pretty` or `json`); defaults by environment
    pub log_format: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_level: "info".to_string(),
            log_format: None,
        }
    }
}

impl ObservabilityConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: env::var("LOG_FORMAT").ok(),
        }
    }

    /// Check if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Whether logs should be human-readable rather than JSON
    pub fn use_pretty_format(&self) -> bool {
        match self.log_format.as_deref() {
            Some("pretty") => true,
            Some(_) => false,
            None => self.is_development(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!("Invalid log level: {}", self.log_level));
        }

        if let Some(format) = &self.log_format {
            if format != "pretty" && format != "json" {
                return Err(format!("Invalid log format: {}", format));
            }
        }

        Ok(())
    }
}

/// Initialize structured logging from environment variables
pub fn init_tracing() -> Result<()> {
    init_tracing_with_config(&ObservabilityConfig::from_env())
}

/// Initialize structured logging with an explicit configuration
pub fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("glyph_segmenter={}", config.log_level).parse()?)
        .add_directive(format!("glyph_segmentation={}", config.log_level).parse()?)
        .add_directive(format!("glyph_output={}", config.log_level).parse()?);

    if config.use_pretty_format() {
        // Pretty formatting for development
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()?;
    } else {
        // JSON formatting for production (default)
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ObservabilityConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.use_pretty_format());
    }

    #[test]
    fn test_explicit_format_overrides_environment() {
        let config = ObservabilityConfig {
            log_format: Some("json".to_string()),
            ..ObservabilityConfig::default()
        };
        assert!(!config.use_pretty_format());

        let config = ObservabilityConfig {
            environment: "production".to_string(),
            log_format: Some("pretty".to_string()),
            ..ObservabilityConfig::default()
        };
        assert!(config.use_pretty_format());
    }

    #[test]
    fn test_invalid_level_rejected() {
        let config = ObservabilityConfig {
            log_level: "loud".to_string(),
            ..ObservabilityConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
