//! Pipeline-build scenarios against file-backed mapping data.

use crate::*;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing::info;

/// Shared storage the loaders fill, keyed by data type.
type SharedStore = Arc<Mutex<HashMap<DataType, MappingSection>>>;

const ENTITY_TRACKING: DataType = DataType::new("EntityTracking");
const BLOCK_CONNECTIONS: DataType = DataType::new("BlockConnections");
const SOUNDS: DataType = DataType::new("Sounds");

fn write_mapping(dir: &Path, name: &str, content: serde_json::Value) -> Arc<JsonMappingData> {
    let path = dir.join(name);
    fs::write(&path, content.to_string()).unwrap();
    Arc::new(JsonMappingData::new(path))
}

/// Loader that copies `section` of `source` into the store under `data_type`.
fn copy_section(
    store: &SharedStore,
    source: &Arc<JsonMappingData>,
    data_type: DataType,
    section: &'static str,
) -> impl Fn() + Send + Sync + 'static {
    let store = store.clone();
    let source = source.clone();
    move || {
        let table = source.section(section).unwrap_or_default();
        store.lock().unwrap().insert(data_type.clone(), table);
    }
}

struct Fixture {
    _dir: TempDir,
    store: SharedStore,
    entity_data: Arc<JsonMappingData>,
    block_data: Arc<JsonMappingData>,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let entity_data = write_mapping(
            dir.path(),
            "1.14-1.13.json",
            serde_json::json!({ "entities": { "minecraft:pig": 90, "minecraft:cow": 92 } }),
        );
        let block_data = write_mapping(
            dir.path(),
            "1.13-1.12.json",
            serde_json::json!({ "connections": { "minecraft:fence": 188 } }),
        );
        Self {
            _dir: dir,
            store: Arc::new(Mutex::new(HashMap::new())),
            entity_data,
            block_data,
        }
    }

    fn register_all(&self, fillers: &mut DataFillers) {
        fillers
            .register(
                ENTITY_TRACKING,
                ProtocolHandle::new("1.14->1.13.2", self.entity_data.clone()),
                copy_section(&self.store, &self.entity_data, ENTITY_TRACKING, "entities"),
            )
            .unwrap();
        fillers
            .register(
                BLOCK_CONNECTIONS,
                ProtocolHandle::new("1.13->1.12.2", self.block_data.clone()),
                copy_section(&self.store, &self.block_data, BLOCK_CONNECTIONS, "connections"),
            )
            .unwrap();
    }

    fn stored(&self, data_type: &DataType) -> Option<MappingSection> {
        self.store.lock().unwrap().get(data_type).cloned()
    }
}

#[test_log::test]
fn test_intent_for_inactive_converter_is_filled_transiently() {
    let fixture = Fixture::new();
    let mut fillers = DataFillers::new();
    fixture.register_all(&mut fillers);
    fillers.register_intent(ENTITY_TRACKING).unwrap();

    let report = fillers
        .initialize_required(&ResolveContext::none_active())
        .unwrap();

    let entities = fixture.stored(&ENTITY_TRACKING).unwrap();
    assert_eq!(entities.get("minecraft:cow"), Some(&92));
    assert!(!fixture.entity_data.is_loaded());
    assert!(!fixture.block_data.is_loaded());
    assert!(fixture.stored(&BLOCK_CONNECTIONS).is_none());
    assert_eq!(report.loaded_types, vec![ENTITY_TRACKING]);
    assert_eq!(fillers.intent_count(), 0);
    info!("✅ Transient fill completed: {:?}", report);
}

#[test_log::test]
fn test_active_converter_follows_normal_path() {
    let fixture = Fixture::new();
    let mut fillers = DataFillers::new();
    fixture.register_all(&mut fillers);
    fillers.register_intent(BLOCK_CONNECTIONS).unwrap();

    // The active converter loads its own data and initializes what it owns
    fixture.block_data.acquire(Hold::Active).unwrap();
    fillers.initialize(&BLOCK_CONNECTIONS).unwrap();
    fixture.store.lock().unwrap().clear();

    let active: HashSet<ProtocolId> = [ProtocolId::from("1.13->1.12.2")].into_iter().collect();
    let report = fillers
        .initialize_required(&ResolveContext::new(|id| active.contains(id)))
        .unwrap();

    // The pass neither reran the loader nor touched the active converter's data
    assert!(fixture.stored(&BLOCK_CONNECTIONS).is_none());
    assert!(fixture.block_data.is_loaded());
    assert_eq!(report.skipped_active, vec![BLOCK_CONNECTIONS]);
    assert!(report.transient_protocols.is_empty());
}

#[test_log::test]
fn test_mixed_active_and_inactive_owners() {
    let fixture = Fixture::new();
    let mut fillers = DataFillers::new();
    fixture.register_all(&mut fillers);
    fillers.register_intent(ENTITY_TRACKING).unwrap();
    fillers.register_intent(BLOCK_CONNECTIONS).unwrap();

    fixture.block_data.acquire(Hold::Active).unwrap();
    fillers.initialize(&BLOCK_CONNECTIONS).unwrap();

    let report = fillers
        .initialize_required(&ResolveContext::new(|id| id.as_str() == "1.13->1.12.2"))
        .unwrap();

    assert!(fixture.stored(&ENTITY_TRACKING).is_some());
    assert!(fixture.stored(&BLOCK_CONNECTIONS).is_some());
    assert!(fixture.block_data.is_loaded());
    assert!(!fixture.entity_data.is_loaded());
    assert_eq!(report.loaded_types, vec![ENTITY_TRACKING]);
    assert_eq!(report.transient_protocols, vec![ProtocolId::from("1.14->1.13.2")]);
}

#[test_log::test]
fn test_intent_registered_before_initializer() {
    let fixture = Fixture::new();
    let mut fillers = DataFillers::new();
    fillers.register_intent(ENTITY_TRACKING).unwrap();
    fixture.register_all(&mut fillers);

    fillers
        .initialize_required(&ResolveContext::none_active())
        .unwrap();
    assert!(fixture.stored(&ENTITY_TRACKING).is_some());
}

#[test_log::test]
fn test_unknown_intent_is_fatal() {
    let fixture = Fixture::new();
    let mut fillers = DataFillers::new();
    fixture.register_all(&mut fillers);
    fillers.register_intent(ENTITY_TRACKING).unwrap();
    fillers.register_intent(SOUNDS).unwrap();

    let error = fillers
        .initialize_required(&ResolveContext::none_active())
        .unwrap_err();

    assert_eq!(error.to_string(), "Initializer for Sounds not found");
    assert!(!fixture.entity_data.is_loaded());
}

#[test_log::test]
fn test_broken_mapping_file_aborts_and_unloads() {
    let fixture = Fixture::new();
    let broken_dir = TempDir::new().unwrap();
    let broken_path = broken_dir.path().join("1.12-1.11.json");
    fs::write(&broken_path, "{ not json").unwrap();
    let broken = Arc::new(JsonMappingData::new(&broken_path));

    let mut fillers = DataFillers::new();
    fixture.register_all(&mut fillers);
    fillers
        .register(SOUNDS, ProtocolHandle::new("1.12->1.11.1", broken), || {})
        .unwrap();
    fillers.register_intent(ENTITY_TRACKING).unwrap();
    fillers.register_intent(BLOCK_CONNECTIONS).unwrap();
    fillers.register_intent(SOUNDS).unwrap();

    let error = fillers
        .initialize_required(&ResolveContext::none_active())
        .unwrap_err();

    match error {
        FillerError::Load { protocol, data_type, source } => {
            assert_eq!(protocol.as_str(), "1.12->1.11.1");
            assert_eq!(data_type, SOUNDS);
            assert!(matches!(source, LoadError::Parse { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!fixture.entity_data.is_loaded());
    assert!(!fixture.block_data.is_loaded());
}

#[test_log::test]
fn test_cleared_registry() {
    let fixture = Fixture::new();
    let mut fillers = DataFillers::new();
    fillers.clear();

    let error = fillers
        .register(
            ENTITY_TRACKING,
            ProtocolHandle::new("1.14->1.13.2", fixture.entity_data.clone()),
            || {},
        )
        .unwrap_err();
    assert!(matches!(error, FillerError::ConfigurationClosed { .. }));
    assert!(!fillers.is_registered(&ENTITY_TRACKING));

    let report = fillers
        .initialize_required(&ResolveContext::none_active())
        .unwrap();
    assert!(report.is_empty());
    assert!(!fixture.entity_data.is_loaded());
}

#[test_log::test]
fn test_shared_registry_runs_the_same_cycle() {
    let fixture = Fixture::new();
    let fillers = SharedDataFillers::new_shared();
    fillers
        .register(
            ENTITY_TRACKING,
            ProtocolHandle::new("1.14->1.13.2", fixture.entity_data.clone()),
            copy_section(&fixture.store, &fixture.entity_data, ENTITY_TRACKING, "entities"),
        )
        .unwrap();
    fillers.register_intent(ENTITY_TRACKING).unwrap();

    let logged = Mutex::new(Vec::new());
    let context = ResolveContext::none_active()
        .with_log(|message| logged.lock().unwrap().push(message.to_string()));
    let report = fillers.initialize_required(&context).unwrap();
    drop(context);

    assert_eq!(report.loaded_types, vec![ENTITY_TRACKING]);
    assert!(fixture.stored(&ENTITY_TRACKING).is_some());
    assert!(!fixture.entity_data.is_loaded());
    assert_eq!(
        logged.into_inner().unwrap(),
        vec!["Loaded additional data classes: EntityTracking"]
    );

    fillers.clear();
    assert!(fillers.register_intent(SOUNDS).is_err());
}
