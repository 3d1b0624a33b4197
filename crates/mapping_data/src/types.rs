//! Identity types shared by the registry and the converters that use it.

use crate::mapping::MappingData;
use std::fmt;
use std::sync::Arc;

/// Identity token for one kind of shared cross-version data.
///
/// Data types are minted by the surrounding pipeline, usually as constants:
///
/// ```rust
/// use mapping_data::DataType;
///
/// const ENTITY_TRACKING: DataType = DataType::new("EntityTracking");
/// assert_eq!(ENTITY_TRACKING.name(), "EntityTracking");
/// ```
///
/// Two tokens are the same data type exactly when their names are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataType(std::borrow::Cow<'static, str>);

impl DataType {
    /// Creates a data type from a static name.
    pub const fn new(name: &'static str) -> Self {
        Self(std::borrow::Cow::Borrowed(name))
    }

    /// Creates a data type from a name only known at runtime (e.g. read from config).
    pub fn named(name: impl Into<String>) -> Self {
        Self(std::borrow::Cow::Owned(name.into()))
    }

    /// The name this data type was minted with.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a converter, e.g. `"1.9->1.8"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtocolId(String);

impl ProtocolId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProtocolId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ProtocolId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Reference to a converter together with the mapping data it owns.
///
/// Cloning is cheap; all clones point at the same mapping-data resource.
#[derive(Clone)]
pub struct ProtocolHandle {
    id: ProtocolId,
    mapping_data: Arc<dyn MappingData>,
}

impl ProtocolHandle {
    pub fn new(id: impl Into<ProtocolId>, mapping_data: Arc<dyn MappingData>) -> Self {
        Self {
            id: id.into(),
            mapping_data,
        }
    }

    pub fn id(&self) -> &ProtocolId {
        &self.id
    }

    pub fn mapping_data(&self) -> &Arc<dyn MappingData> {
        &self.mapping_data
    }
}

impl fmt::Debug for ProtocolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolHandle")
            .field("id", &self.id)
            .field("loaded", &self.mapping_data.is_loaded())
            .finish()
    }
}
