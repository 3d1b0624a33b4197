//! Configuration management for the protocol bridge.
//!
//! This module handles loading and validation of the bridge configuration from
//! TOML files. The configuration describes the available converters, the
//! mapping files they own, which converters make up the pipeline being built,
//! and how mapping data is loaded.

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Where converter mapping files are located
    #[serde(default)]
    pub mappings: MappingSettings,
    /// How mapping data is loaded during a pipeline build
    #[serde(default)]
    pub loading: LoadingSettings,
    /// Converters that make up the pipeline being built
    #[serde(default)]
    pub pipeline: PipelineSettings,
    /// All converters known to the bridge
    #[serde(default)]
    pub converters: Vec<ConverterSettings>,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
    /// Optional file that receives a plain-text copy of the log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

/// Mapping file location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingSettings {
    /// Directory holding one JSON mapping file per converter
    #[serde(default = "default_mapping_directory")]
    pub directory: String,
}

/// Whether mapping data is loaded lazily or all at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingIntention {
    /// Load only what the active converters and their intents need.
    #[default]
    Lazy,
    /// Load every converter's mapping data and fill every shared data type.
    All,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadingSettings {
    #[serde(default)]
    pub intention: LoadingIntention,
}

/// Converters active in the pipeline being built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default)]
    pub active: Vec<String>,
}

/// One converter between two adjacent protocol versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterSettings {
    /// Unique converter name, e.g. "1.13->1.12.2"
    pub name: String,
    /// Mapping file name, relative to the mapping directory
    pub mapping_file: String,
    /// Shared data types this converter fills from its mapping data
    #[serde(default)]
    pub provides: Vec<String>,
    /// Shared data types this converter reads
    #[serde(default)]
    pub intents: Vec<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_mapping_directory() -> String {
    "mappings".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

impl Default for MappingSettings {
    fn default() -> Self {
        Self {
            directory: default_mapping_directory(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the
    /// specified path and returns the default configuration.
    pub async fn load_from_file(path: &Path) -> Result<Self, BridgeError> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    pub fn mapping_directory(&self) -> PathBuf {
        PathBuf::from(&self.mappings.directory)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.mappings.directory.is_empty() {
            return Err("Mapping directory cannot be empty".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        if self.logging.file_path.as_deref() == Some("") {
            return Err("Log file path cannot be empty".to_string());
        }

        let mut names = HashSet::new();
        for converter in &self.converters {
            if converter.name.is_empty() {
                return Err("Converter name cannot be empty".to_string());
            }
            if converter.mapping_file.is_empty() {
                return Err(format!("Converter {} has no mapping file", converter.name));
            }
            if !names.insert(converter.name.as_str()) {
                return Err(format!("Duplicate converter name: {}", converter.name));
            }
            if converter
                .provides
                .iter()
                .chain(&converter.intents)
                .any(|data_type| data_type.is_empty())
            {
                return Err(format!(
                    "Converter {} declares an empty data type name",
                    converter.name
                ));
            }
        }

        for active in &self.pipeline.active {
            if !names.contains(active.as_str()) {
                return Err(format!("Active converter is not declared: {active}"));
            }
        }

        Ok(())
    }
}
