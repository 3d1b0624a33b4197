//! Shared mapping-data lifecycle for protocol converters.
//!
//! Converters translating between two protocol versions own large mapping
//! tables. Some of the data derived from those tables is needed by other
//! converters too, even when the owning converter is not part of the pipeline
//! being built. This crate keeps track of who can fill which data type
//! ([`DataFillers::register`]), who needs it ([`DataFillers::register_intent`]),
//! and at the end of a pipeline build loads exactly the mapping data that is
//! missing, fills the data, and unloads it again
//! ([`DataFillers::initialize_required`]).
//!
//! ```rust
//! use mapping_data::{DataFillers, DataType, JsonMappingData, ProtocolHandle, ResolveContext};
//! use std::sync::Arc;
//!
//! const ENTITY_TRACKING: DataType = DataType::new("EntityTracking");
//!
//! let owner = ProtocolHandle::new("1.13->1.12.2", Arc::new(JsonMappingData::new("1.13.json")));
//! let mut fillers = DataFillers::new();
//! fillers.register(ENTITY_TRACKING, owner, || { /* copy tables into shared storage */ })?;
//! fillers.register_intent(ENTITY_TRACKING)?;
//!
//! // `1.13->1.12.2` is active here, so nothing extra is loaded
//! let report = fillers.initialize_required(&ResolveContext::new(|_| true))?;
//! assert!(report.loaded_types.is_empty());
//! # Ok::<(), mapping_data::FillerError>(())
//! ```

mod error;
mod fillers;
mod mapping;
mod resolve;
mod shared;
mod types;

pub use error::FillerError;
pub use fillers::DataFillers;
pub use mapping::{
    Hold, Holders, JsonMappingData, LoadError, MappingData, MappingSection, Residency,
};
pub use resolve::{Loader, ResolutionReport, ResolveContext};
pub use shared::SharedDataFillers;
pub use types::{DataType, ProtocolHandle, ProtocolId};

#[cfg(test)]
mod tests;
