//! Storage for data shared between converters.

use dashmap::DashMap;
use mapping_data::{DataType, MappingSection};
use std::sync::Arc;

/// Shared data filled by the loaders registered with the data registry.
///
/// Each data type holds the mapping section copied from its owner's mapping
/// data, so it stays available after that mapping data is unloaded again.
#[derive(Debug, Default, Clone)]
pub struct SharedDataStore {
    entries: Arc<DashMap<DataType, MappingSection>>,
}

impl SharedDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `section` for `data_type`, replacing earlier contents.
    pub fn fill(&self, data_type: DataType, section: MappingSection) {
        self.entries.insert(data_type, section);
    }

    pub fn get(&self, data_type: &DataType) -> Option<MappingSection> {
        self.entries.get(data_type).map(|entry| entry.value().clone())
    }

    /// Looks up a single id in the data stored for `data_type`.
    pub fn lookup(&self, data_type: &DataType, key: &str) -> Option<u32> {
        self.entries
            .get(data_type)
            .and_then(|entry| entry.value().get(key).copied())
    }

    pub fn contains(&self, data_type: &DataType) -> bool {
        self.entries.contains_key(data_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Filled data types, sorted by name.
    pub fn data_types(&self) -> Vec<DataType> {
        let mut types: Vec<DataType> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        types.sort();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_lookup() {
        let store = SharedDataStore::new();
        let entity_tracking = DataType::new("EntityTracking");
        assert!(store.is_empty());

        let mut section = MappingSection::new();
        section.insert("minecraft:pig".to_string(), 90);
        store.fill(entity_tracking.clone(), section);

        assert!(store.contains(&entity_tracking));
        assert_eq!(store.lookup(&entity_tracking, "minecraft:pig"), Some(90));
        assert_eq!(store.lookup(&entity_tracking, "minecraft:cow"), None);
        assert_eq!(store.lookup(&DataType::new("Sounds"), "minecraft:pig"), None);
    }

    #[test]
    fn test_clones_share_entries() {
        let store = SharedDataStore::new();
        let clone = store.clone();
        clone.fill(DataType::new("Sounds"), MappingSection::new());
        clone.fill(DataType::new("BlockConnections"), MappingSection::new());

        assert_eq!(store.len(), 2);
        assert_eq!(
            store.data_types(),
            vec![DataType::new("BlockConnections"), DataType::new("Sounds")]
        );
    }
}
