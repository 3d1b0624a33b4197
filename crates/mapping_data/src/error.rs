//! Error types for the shared data registry.

use crate::mapping::LoadError;
use crate::types::{DataType, ProtocolId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FillerError {
    /// A registration was attempted after the registry was cleared.
    #[error(
        "Cannot register {action} after the mapping data loader has shut down. \
         Consider setting the loading intention to \"all\" instead"
    )]
    ConfigurationClosed { action: &'static str },

    /// No initializer was registered for the requested data type.
    #[error("Initializer for {0} not found")]
    UnknownType(DataType),

    /// The mapping data of a converter failed to load.
    #[error("Failed to load mapping data of {protocol} for {data_type}: {source}")]
    Load {
        protocol: ProtocolId,
        data_type: DataType,
        #[source]
        source: LoadError,
    },
}
