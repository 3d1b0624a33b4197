//! Converter catalogue and pipeline construction.
//!
//! A pipeline build registers every known converter's shared data with a fresh
//! [`DataFillers`] registry, loads the mapping data of the active converters,
//! and then lets the registry fill whatever the active converters still need
//! from converters that are not part of the pipeline.

use crate::config::{AppConfig, LoadingIntention};
use crate::error::BridgeError;
use crate::store::SharedDataStore;
use mapping_data::{
    DataFillers, DataType, FillerError, Hold, JsonMappingData, MappingData, ProtocolHandle,
    ProtocolId, ResolutionReport, ResolveContext,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A converter between two adjacent protocol versions.
#[derive(Debug)]
pub struct Converter {
    handle: ProtocolHandle,
    mapping: Arc<JsonMappingData>,
    provides: Vec<DataType>,
    intents: Vec<DataType>,
}

impl Converter {
    pub fn new(
        name: &str,
        mapping_path: impl AsRef<Path>,
        provides: Vec<DataType>,
        intents: Vec<DataType>,
    ) -> Self {
        let mapping = Arc::new(JsonMappingData::new(mapping_path.as_ref()));
        Self {
            handle: ProtocolHandle::new(name, mapping.clone()),
            mapping,
            provides,
            intents,
        }
    }

    pub fn id(&self) -> &ProtocolId {
        self.handle.id()
    }

    pub fn mapping(&self) -> &Arc<JsonMappingData> {
        &self.mapping
    }

    pub fn provides(&self) -> &[DataType] {
        &self.provides
    }

    pub fn intents(&self) -> &[DataType] {
        &self.intents
    }

    /// Registers a loader for every data type this converter provides. Each
    /// loader copies the mapping section named after the data type into `store`.
    fn register_fillers(
        &self,
        fillers: &mut DataFillers,
        store: &SharedDataStore,
    ) -> Result<(), FillerError> {
        for data_type in &self.provides {
            let mapping = self.mapping.clone();
            let store = store.clone();
            let data_type_for_loader = data_type.clone();
            let converter = self.id().clone();

            fillers.register(data_type.clone(), self.handle.clone(), move || {
                match mapping.section(data_type_for_loader.name()) {
                    Some(section) => {
                        debug!(
                            "🧩 Filled {} with {} entries from {}",
                            data_type_for_loader,
                            section.len(),
                            converter
                        );
                        store.fill(data_type_for_loader.clone(), section);
                    }
                    None => warn!(
                        "⚠️ Mapping data of {} has no section for {}",
                        converter, data_type_for_loader
                    ),
                }
            })?;
        }
        Ok(())
    }

    fn register_intents(&self, fillers: &mut DataFillers) -> Result<(), FillerError> {
        for data_type in &self.intents {
            fillers.register_intent(data_type.clone())?;
        }
        Ok(())
    }

    /// Takes an active hold on this converter's mapping data, loading it unless
    /// it is already loaded.
    fn load_mappings(&self) -> Result<(), BridgeError> {
        self.mapping
            .acquire(Hold::Active)
            .map(|_| ())
            .map_err(|source| BridgeError::Mapping {
                converter: self.id().to_string(),
                source,
            })
    }

    /// Loads the mapping data and fills every data type this converter provides.
    fn activate(&self, fillers: &DataFillers) -> Result<(), BridgeError> {
        self.load_mappings()?;
        for data_type in &self.provides {
            fillers.initialize(data_type)?;
        }
        Ok(())
    }
}

/// All converters known to the bridge, in configuration order.
#[derive(Debug, Default)]
pub struct ConverterCatalogue {
    converters: Vec<Converter>,
}

impl ConverterCatalogue {
    pub fn from_config(config: &AppConfig) -> Self {
        let directory = config.mapping_directory();
        let converters = config
            .converters
            .iter()
            .map(|settings| {
                Converter::new(
                    &settings.name,
                    directory.join(&settings.mapping_file),
                    settings.provides.iter().map(DataType::named).collect(),
                    settings.intents.iter().map(DataType::named).collect(),
                )
            })
            .collect();
        Self { converters }
    }

    pub fn push(&mut self, converter: Converter) {
        self.converters.push(converter);
    }

    pub fn get(&self, name: &str) -> Option<&Converter> {
        self.converters.iter().find(|converter| converter.id().as_str() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Converter> {
        self.converters.iter()
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Converters whose mapping data is currently loaded.
    pub fn resident(&self) -> Vec<ProtocolId> {
        self.converters
            .iter()
            .filter(|converter| converter.mapping.is_loaded())
            .map(|converter| converter.id().clone())
            .collect()
    }

    /// Drops every hold on the converters' mapping data and unloads it.
    pub fn unload_all(&self) {
        for converter in &self.converters {
            converter.mapping.evict();
        }
    }
}

/// Result of one pipeline build.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub intention: LoadingIntention,
    /// Converters that make up the pipeline
    pub active: Vec<ProtocolId>,
    /// Outcome of intent resolution; `None` when everything was loaded eagerly
    pub resolution: Option<ResolutionReport>,
    /// Shared data types available after the build
    pub filled: Vec<DataType>,
    /// Converters whose mapping data stays loaded after the build
    pub resident: Vec<ProtocolId>,
}

/// Builds one pipeline out of `catalogue`, with the converters named in
/// `active` as its members.
pub fn build_pipeline(
    catalogue: &ConverterCatalogue,
    active: &[String],
    intention: LoadingIntention,
    store: &SharedDataStore,
) -> Result<BuildSummary, BridgeError> {
    let mut members = Vec::with_capacity(active.len());
    for name in active {
        let converter = catalogue
            .get(name)
            .ok_or_else(|| BridgeError::ConverterNotFound(name.clone()))?;
        members.push(converter);
    }
    let active_ids: HashSet<ProtocolId> =
        members.iter().map(|converter| converter.id().clone()).collect();

    info!(
        "🔧 Building pipeline with {} of {} converter(s) ({:?} loading)",
        members.len(),
        catalogue.len(),
        intention
    );

    let mut fillers = DataFillers::new();
    for converter in catalogue.iter() {
        converter.register_fillers(&mut fillers, store)?;
    }
    for converter in &members {
        converter.register_intents(&mut fillers)?;
    }

    let resolution = match intention {
        LoadingIntention::Lazy => {
            for converter in &members {
                converter.activate(&fillers)?;
            }
            let context = ResolveContext::new(|id| active_ids.contains(id));
            let report = fillers.initialize_required(&context)?;
            Some(report)
        }
        LoadingIntention::All => {
            for converter in catalogue.iter() {
                converter.activate(&fillers)?;
            }
            None
        }
    };
    fillers.clear();

    Ok(BuildSummary {
        intention,
        active: members.iter().map(|converter| converter.id().clone()).collect(),
        resolution,
        filled: store.data_types(),
        resident: catalogue.resident(),
    })
}
