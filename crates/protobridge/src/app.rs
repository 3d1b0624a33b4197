//! Main application logic and lifecycle management.
//!
//! The `Application` loads the configuration, builds the converter catalogue,
//! runs one pipeline build and reports what was loaded.

use crate::cli::CliArgs;
use crate::config::{AppConfig, LoadingIntention};
use crate::pipeline::{build_pipeline, BuildSummary, ConverterCatalogue};
use crate::store::SharedDataStore;
use tracing::{info, warn};

pub struct Application {
    config: AppConfig,
    catalogue: ConverterCatalogue,
    store: SharedDataStore,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// Loads configuration (creating a default file if missing), applies
    /// command-line overrides and validates the merged result.
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let config = AppConfig::load_from_file(&args.config_path).await?;
        let config = Self::apply_overrides(config, &args);

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        Ok(Self::from_config(config))
    }

    pub fn from_config(config: AppConfig) -> Self {
        let catalogue = ConverterCatalogue::from_config(&config);
        Self {
            config,
            catalogue,
            store: SharedDataStore::new(),
        }
    }

    fn apply_overrides(mut config: AppConfig, args: &CliArgs) -> AppConfig {
        if let Some(mapping_dir) = &args.mapping_dir {
            config.mappings.directory = mapping_dir.to_string_lossy().to_string();
        }
        if let Some(log_level) = &args.log_level {
            config.logging.level = log_level.clone();
        }
        if args.json_logs {
            config.logging.json_format = true;
        }
        if args.load_all {
            config.loading.intention = LoadingIntention::All;
        }
        config
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &SharedDataStore {
        &self.store
    }

    /// Builds the configured pipeline, logs a summary and unloads all mapping
    /// data again.
    pub fn run(self) -> Result<BuildSummary, Box<dyn std::error::Error>> {
        self.log_configuration_summary();

        let result = build_pipeline(
            &self.catalogue,
            &self.config.pipeline.active,
            self.config.loading.intention,
            &self.store,
        );

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                self.catalogue.unload_all();
                return Err(e.into());
            }
        };
        log_build_summary(&summary);

        info!("🧹 Unloading {} resident mapping data set(s)", summary.resident.len());
        self.catalogue.unload_all();
        Ok(summary)
    }

    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  📂 Mapping directory: {}", self.config.mappings.directory);
        info!("  🔌 Converters: {}", self.catalogue.len());
        info!("  🎯 Active: {}", self.config.pipeline.active.join(", "));
        info!("  📦 Loading intention: {:?}", self.config.loading.intention);
    }
}

fn log_build_summary(summary: &BuildSummary) {
    info!("📊 Pipeline build complete:");
    info!("  - Active converters: {}", summary.active.len());
    info!("  - Shared data types filled: {}", summary.filled.len());
    info!("  - Resident mapping data: {}", summary.resident.len());

    match &summary.resolution {
        Some(report) => {
            info!("  - Intents loaded transiently: {}", report.loaded_types.len());
            info!("  - Intents served by active converters: {}", report.skipped_active.len());
            if !report.transient_protocols.is_empty() {
                warn!(
                    "⚠️ Mapping data of {} inactive converter(s) was loaded for intents",
                    report.transient_protocols.len()
                );
            }
        }
        None => info!("  - Intent resolution skipped (all mapping data loaded)"),
    }
}
