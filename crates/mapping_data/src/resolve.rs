//! Resolution of data intents against the converters that are actually active.

use crate::error::FillerError;
use crate::mapping::{Hold, MappingData};
use crate::types::{DataType, ProtocolHandle, ProtocolId};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Callback that fills a shared data structure from its owner's mapping data.
pub type Loader = Arc<dyn Fn() + Send + Sync>;

/// The owner and loader registered for one data type.
#[derive(Clone)]
pub(crate) struct Initializer {
    pub(crate) owner: ProtocolHandle,
    pub(crate) loader: Loader,
}

impl fmt::Debug for Initializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Initializer")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// Capabilities a resolution pass needs from the surrounding pipeline.
///
/// `is_active` answers whether a converter is part of the pipeline being
/// built. `log` receives the summary of data that had to be loaded for
/// intents; by default it is forwarded to `tracing` at info level.
pub struct ResolveContext<'a> {
    is_active: Box<dyn Fn(&ProtocolId) -> bool + 'a>,
    log: Box<dyn Fn(&str) + 'a>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(is_active: impl Fn(&ProtocolId) -> bool + 'a) -> Self {
        Self {
            is_active: Box::new(is_active),
            log: Box::new(|message: &str| info!("📦 {}", message)),
        }
    }

    /// A context in which no converter is active.
    pub fn none_active() -> Self {
        Self::new(|_| false)
    }

    /// Replaces the log sink.
    pub fn with_log(mut self, log: impl Fn(&str) + 'a) -> Self {
        self.log = Box::new(log);
        self
    }

    pub fn is_active(&self, protocol: &ProtocolId) -> bool {
        (self.is_active)(protocol)
    }

    pub fn log(&self, message: &str) {
        (self.log)(message)
    }
}

impl fmt::Debug for ResolveContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveContext").finish_non_exhaustive()
    }
}

/// Outcome of a successful resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    /// Data types whose loader ran to satisfy an intent.
    pub loaded_types: Vec<DataType>,
    /// Intents skipped because their owner is active.
    pub skipped_active: Vec<DataType>,
    /// Converters whose mapping data the pass held transiently.
    pub transient_protocols: Vec<ProtocolId>,
}

impl ResolutionReport {
    pub fn is_empty(&self) -> bool {
        self.loaded_types.is_empty() && self.skipped_active.is_empty()
    }
}

/// Transient holds taken by the current pass.
///
/// Every hold recorded here is released when the pass finishes, including
/// when it bails out early with an error or a loader panics.
#[derive(Default)]
struct TransientLoads {
    held: Vec<ProtocolHandle>,
}

impl TransientLoads {
    fn record(&mut self, owner: ProtocolHandle) {
        self.held.push(owner);
    }

    /// Whether this pass already holds `data`, possibly through another owner.
    fn holds(&self, data: &Arc<dyn MappingData>) -> bool {
        self.held
            .iter()
            .any(|owner| same_resource(owner.mapping_data(), data))
    }

    fn release_all(&mut self) -> Vec<ProtocolId> {
        self.held
            .drain(..)
            .map(|owner| {
                if owner.mapping_data().release(Hold::Transient) {
                    debug!("📤 Unloaded transient mapping data of {}", owner.id());
                } else {
                    debug!("📌 Mapping data of {} is still held elsewhere, keeping it loaded", owner.id());
                }
                owner.id().clone()
            })
            .collect()
    }
}

impl Drop for TransientLoads {
    fn drop(&mut self) {
        if !self.held.is_empty() {
            warn!(
                "⚠️ Resolution aborted, releasing {} transiently loaded mapping data set(s)",
                self.held.len()
            );
            self.release_all();
        }
    }
}

fn same_resource(a: &Arc<dyn MappingData>, b: &Arc<dyn MappingData>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Runs the loaders for all pending intents whose owner is not active.
///
/// Every intent must have an initializer; a missing one fails the pass before
/// any mapping data is touched. The order in which intents are processed is
/// unspecified.
pub(crate) fn resolve_intents(
    pending: Vec<(DataType, Option<Initializer>)>,
    context: &ResolveContext<'_>,
) -> Result<ResolutionReport, FillerError> {
    let pending = pending
        .into_iter()
        .map(|(data_type, initializer)| match initializer {
            Some(initializer) => Ok((data_type, initializer)),
            None => Err(FillerError::UnknownType(data_type)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = ResolutionReport::default();
    let mut transient = TransientLoads::default();

    for (data_type, initializer) in pending {
        let owner = &initializer.owner;
        if context.is_active(owner.id()) {
            // Active owners load their own data and initialize it themselves
            debug!("⏭️ {} is provided by active converter {}", data_type, owner.id());
            report.skipped_active.push(data_type);
            continue;
        }

        let mapping_data = owner.mapping_data();
        if !transient.holds(mapping_data) {
            let held = mapping_data
                .acquire(Hold::Transient)
                .map_err(|source| FillerError::Load {
                    protocol: owner.id().clone(),
                    data_type: data_type.clone(),
                    source,
                })?;
            if held {
                debug!("📥 Holding mapping data of inactive converter {} for {}", owner.id(), data_type);
                transient.record(owner.clone());
            }
        }

        (initializer.loader)();
        report.loaded_types.push(data_type);
    }

    if !report.loaded_types.is_empty() {
        let names: Vec<&str> = report.loaded_types.iter().map(DataType::name).collect();
        context.log(&format!("Loaded additional data classes: {}", names.join(", ")));
    }

    report.transient_protocols = transient.release_all();
    Ok(report)
}
