//! # protobridge - Pipeline Builder
//!
//! Builds a protocol translation pipeline out of the converters declared in the
//! configuration and makes sure every shared data type the pipeline needs is
//! filled, loading the mapping data of inactive converters only for as long as
//! it takes to fill that data.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! protobridge
//!
//! # Specify custom configuration and mapping directory
//! protobridge --config production.toml --mappings /opt/protobridge/mappings
//!
//! # Load every converter's mapping data up front
//! protobridge --load-all --log-level debug
//! ```
//!
//! ## Configuration
//!
//! The configuration is read from a TOML file (default: `protobridge.toml`).
//! If the file doesn't exist, a default configuration will be created.

use tracing::error;

mod app;
mod cli;
mod config;
mod error;
mod logging;
mod pipeline;
mod store;

/// Main entry point for the bridge.
///
/// Parses the command line, loads the configuration, sets up logging and runs
/// one pipeline build.
///
/// # Exit Codes
///
/// * **0**: The pipeline was built successfully
/// * **1**: Error during startup, configuration, or the build
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Load configuration to get logging settings
    let mut logging_settings = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default()
        .logging;
    if let Some(level) = &args.log_level {
        logging_settings.level = level.clone();
    }

    if let Err(e) = logging::setup_logging(&logging_settings, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run() {
                error!("❌ Pipeline build failed: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

pub use app::Application;
pub use cli::CliArgs;
pub use config::{
    AppConfig, ConverterSettings, LoadingIntention, LoadingSettings,
    LoggingSettings, MappingSettings, PipelineSettings,
};
pub use error::BridgeError;
pub use pipeline::{build_pipeline, BuildSummary, Converter, ConverterCatalogue};
pub use store::SharedDataStore;
