//! Error types for the bridge driver.

use mapping_data::{FillerError, LoadError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to write configuration file: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Converter not found: {0}")]
    ConverterNotFound(String),

    #[error("Failed to load mapping data for converter {converter}: {source}")]
    Mapping {
        converter: String,
        #[source]
        source: LoadError,
    },

    #[error("Shared data error: {0}")]
    SharedData(#[from] FillerError),
}
