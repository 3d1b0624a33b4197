//! Thread-safe registry for pipelines that are built concurrently.

use crate::error::FillerError;
use crate::fillers::DataFillers;
use crate::resolve::{resolve_intents, ResolutionReport, ResolveContext};
use crate::types::{DataType, ProtocolHandle};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// [`DataFillers`] behind locks, usable from several converter-construction
/// paths at once.
///
/// Registration, clearing and resolution are serialized against each other, so
/// a registration can never slip past a `clear()` or into the middle of a
/// resolution pass. Loaders run without the registry locked and may call
/// [`initialize`](Self::initialize) for data types they depend on. They must
/// not register anything themselves.
#[derive(Debug, Default)]
pub struct SharedDataFillers {
    state: Mutex<DataFillers>,
    resolution: Mutex<()>,
}

impl SharedDataFillers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn register(
        &self,
        data_type: DataType,
        owner: ProtocolHandle,
        loader: impl Fn() + Send + Sync + 'static,
    ) -> Result<(), FillerError> {
        let _resolution = self.resolution_guard();
        self.state()
            .insert_initializer(data_type, owner, Arc::new(loader))
    }

    pub fn register_intent(&self, data_type: DataType) -> Result<(), FillerError> {
        let _resolution = self.resolution_guard();
        self.state().register_intent(data_type)
    }

    /// Runs the loader registered for `data_type`. The registry is not locked
    /// while the loader runs.
    pub fn initialize(&self, data_type: &DataType) -> Result<(), FillerError> {
        let initializer = self.state().initializer(data_type)?;
        (initializer.loader)();
        Ok(())
    }

    /// See [`DataFillers::initialize_required`]. Concurrent calls run one at a time.
    pub fn initialize_required(
        &self,
        context: &ResolveContext<'_>,
    ) -> Result<ResolutionReport, FillerError> {
        let _resolution = self.resolution_guard();
        // Loaders may call `initialize` during the pass, so the registry is
        // emptied only once the pass is over, also when a loader panics
        let _reset = ResetOnExit(self);
        let pending = self.state().pending_intents();
        resolve_intents(pending, context)
    }

    pub fn clear(&self) {
        let _resolution = self.resolution_guard();
        self.state().clear();
    }

    pub fn is_cleared(&self) -> bool {
        self.state().is_cleared()
    }

    pub fn is_registered(&self, data_type: &DataType) -> bool {
        self.state().is_registered(data_type)
    }

    pub fn intent_count(&self) -> usize {
        self.state().intent_count()
    }

    pub fn initializer_count(&self) -> usize {
        self.state().initializer_count()
    }

    fn state(&self) -> MutexGuard<'_, DataFillers> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolution_guard(&self) -> MutexGuard<'_, ()> {
        self.resolution.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct ResetOnExit<'a>(&'a SharedDataFillers);

impl Drop for ResetOnExit<'_> {
    fn drop(&mut self) {
        self.0.state().reset();
    }
}
