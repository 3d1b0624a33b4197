//! Registry of shared data initializers and intents for one pipeline build.

use crate::error::FillerError;
use crate::resolve::{resolve_intents, Initializer, ResolutionReport, ResolveContext};
use crate::types::{DataType, ProtocolHandle};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Registry of data shared between converters.
///
/// The registration, intention and loading process for one pipeline build:
///
/// 1. Every converter that owns shared data calls [`register`](Self::register)
///    for each data type it can fill from its mapping data.
/// 2. Every converter that reads a data type calls
///    [`register_intent`](Self::register_intent) for it.
/// 3. Active converters load their own mapping data and call
///    [`initialize`](Self::initialize) for the types they own.
/// 4. The driver calls [`initialize_required`](Self::initialize_required) once,
///    which fills the intended types whose owner was not active.
///
/// [`clear`](Self::clear) closes the registry for good. Registrations after
/// that fail with [`FillerError::ConfigurationClosed`].
#[derive(Debug, Default)]
pub struct DataFillers {
    initializers: HashMap<DataType, Initializer>,
    intents: HashSet<DataType>,
    cleared: bool,
}

impl DataFillers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the loader that fills `data_type` from `owner`'s mapping data.
    ///
    /// Registering the same type again replaces the previous initializer.
    pub fn register(
        &mut self,
        data_type: DataType,
        owner: ProtocolHandle,
        loader: impl Fn() + Send + Sync + 'static,
    ) -> Result<(), FillerError> {
        self.insert_initializer(data_type, owner, Arc::new(loader))
    }

    pub(crate) fn insert_initializer(
        &mut self,
        data_type: DataType,
        owner: ProtocolHandle,
        loader: crate::resolve::Loader,
    ) -> Result<(), FillerError> {
        self.ensure_open("initializer")?;
        debug!("📝 Registered initializer for {} from {}", data_type, owner.id());
        self.initializers
            .insert(data_type, Initializer { owner, loader });
        Ok(())
    }

    /// Registers an intent to use `data_type`, making sure it gets filled.
    ///
    /// The matching initializer may be registered later; a missing one is
    /// only reported by [`initialize_required`](Self::initialize_required).
    pub fn register_intent(&mut self, data_type: DataType) -> Result<(), FillerError> {
        self.ensure_open("intention")?;
        debug!("📝 Registered intent for {}", data_type);
        self.intents.insert(data_type);
        Ok(())
    }

    /// Runs the loader registered for `data_type`.
    ///
    /// The caller is responsible for the owner's mapping data being loaded.
    /// Every call runs the loader again.
    pub fn initialize(&self, data_type: &DataType) -> Result<(), FillerError> {
        let initializer = self.initializer(data_type)?;
        (initializer.loader)();
        Ok(())
    }

    /// Fills every intended data type whose owner is not active in `context`.
    ///
    /// Mapping data that is not yet loaded is loaded for the duration of the
    /// pass and unloaded again before returning, also when the pass fails.
    /// Afterwards the registry is empty, whether the pass succeeded or not.
    pub fn initialize_required(
        &mut self,
        context: &ResolveContext<'_>,
    ) -> Result<ResolutionReport, FillerError> {
        // Emptied up front so a panicking loader cannot leave stale entries
        let pending = self.pending_intents();
        self.reset();
        resolve_intents(pending, context)
    }

    /// Closes the registry. Any later registration fails.
    pub fn clear(&mut self) {
        if !self.cleared {
            info!(
                "🧹 Closing data registry ({} initializer(s), {} intent(s) dropped)",
                self.initializers.len(),
                self.intents.len()
            );
        }
        self.reset();
        self.cleared = true;
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    pub fn is_registered(&self, data_type: &DataType) -> bool {
        self.initializers.contains_key(data_type)
    }

    pub fn has_intent(&self, data_type: &DataType) -> bool {
        self.intents.contains(data_type)
    }

    pub fn intent_count(&self) -> usize {
        self.intents.len()
    }

    pub fn initializer_count(&self) -> usize {
        self.initializers.len()
    }

    /// Data types that currently have an initializer, in no particular order.
    pub fn registered_types(&self) -> Vec<DataType> {
        self.initializers.keys().cloned().collect()
    }

    pub(crate) fn initializer(&self, data_type: &DataType) -> Result<Initializer, FillerError> {
        self.initializers
            .get(data_type)
            .cloned()
            .ok_or_else(|| FillerError::UnknownType(data_type.clone()))
    }

    pub(crate) fn pending_intents(&self) -> Vec<(DataType, Option<Initializer>)> {
        self.intents
            .iter()
            .map(|data_type| (data_type.clone(), self.initializers.get(data_type).cloned()))
            .collect()
    }

    pub(crate) fn reset(&mut self) {
        self.initializers.clear();
        self.intents.clear();
    }

    fn ensure_open(&self, action: &'static str) -> Result<(), FillerError> {
        if self.cleared {
            return Err(FillerError::ConfigurationClosed { action });
        }
        Ok(())
    }
}
