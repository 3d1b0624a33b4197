//! Mapping-data resources owned by converters.
//!
//! A converter's mapping data is a set of large id-to-id lookup tables for one
//! version pair. The registry only ever drives the [`MappingData`] contract;
//! [`JsonMappingData`] is the file-backed implementation used by the bridge.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading a mapping-data resource.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed mapping file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Mapping data unavailable: {0}")]
    Unavailable(String),
}

/// Lazily loadable lookup tables for one converter.
///
/// `is_loaded`, `load` and `unload` are the raw operations and are atomic on
/// their own. Converters and resolution passes go through
/// [`acquire`](Self::acquire) and [`release`](Self::release) instead, which
/// run the "already loaded" check, the load and the final unload under the
/// resource's [`Residency`] lock.
pub trait MappingData: Send + Sync {
    fn is_loaded(&self) -> bool;

    /// Loads the tables. Loading already-loaded data is allowed and replaces it.
    fn load(&self) -> Result<(), LoadError>;

    fn unload(&self);

    /// Who currently keeps this resource loaded.
    fn residency(&self) -> &Residency;

    /// Takes a hold on the data, loading it if needed.
    ///
    /// Returns whether a hold was taken. A transient hold is refused when the
    /// data is already loaded by someone who does not go through residency
    /// tracking, since unloading it later would pull it from under them.
    fn acquire(&self, hold: Hold) -> Result<bool, LoadError> {
        self.residency().acquire(self, hold)
    }

    /// Gives up a hold taken with [`acquire`](Self::acquire). Returns whether
    /// the data was unloaded because nobody holds it any more.
    fn release(&self, hold: Hold) -> bool {
        self.residency().release(self, hold)
    }

    /// Drops every hold and unloads the data.
    fn evict(&self) {
        self.residency().evict(self)
    }
}

/// Kind of hold on a mapping-data resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hold {
    /// The owning converter is part of a pipeline.
    Active,
    /// A resolution pass loaded the data to fill intents and unloads it after.
    Transient,
}

/// Hold counts of one mapping-data resource.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Holders {
    pub active: usize,
    pub transient: usize,
}

/// Per-resource lock and hold counts.
///
/// Every check-then-load and every last-hold unload of a resource happens
/// with this lock held, so an owner activated by another pipeline while a
/// resolution pass holds its data transiently keeps the data loaded.
#[derive(Debug, Default)]
pub struct Residency {
    holders: Mutex<Holders>,
}

impl Residency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holders(&self) -> Holders {
        *self.lock()
    }

    pub fn acquire<M>(&self, data: &M, hold: Hold) -> Result<bool, LoadError>
    where
        M: MappingData + ?Sized,
    {
        let mut holders = self.lock();
        match hold {
            Hold::Active => {
                if !data.is_loaded() {
                    data.load()?;
                }
                holders.active += 1;
            }
            Hold::Transient => {
                if data.is_loaded() {
                    if holders.transient == 0 {
                        return Ok(false);
                    }
                } else {
                    data.load()?;
                }
                holders.transient += 1;
            }
        }
        Ok(true)
    }

    pub fn release<M>(&self, data: &M, hold: Hold) -> bool
    where
        M: MappingData + ?Sized,
    {
        let mut holders = self.lock();
        let count = match hold {
            Hold::Active => &mut holders.active,
            Hold::Transient => &mut holders.transient,
        };
        *count = count.saturating_sub(1);

        if *holders == Holders::default() {
            data.unload();
            true
        } else {
            false
        }
    }

    pub fn evict<M>(&self, data: &M)
    where
        M: MappingData + ?Sized,
    {
        let mut holders = self.lock();
        *holders = Holders::default();
        data.unload();
    }

    fn lock(&self) -> MutexGuard<'_, Holders> {
        self.holders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A single named section of a mapping file: `name -> id`.
pub type MappingSection = HashMap<String, u32>;

#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
struct MappingFile {
    sections: HashMap<String, MappingSection>,
}

/// Mapping data read from a JSON file of the shape
/// `{ "<section>": { "<name>": <id>, ... }, ... }`.
#[derive(Debug)]
pub struct JsonMappingData {
    path: PathBuf,
    tables: RwLock<Option<MappingFile>>,
    residency: Residency,
}

impl JsonMappingData {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tables: RwLock::new(None),
            residency: Residency::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a copy of one section, or `None` if the data is not loaded or
    /// the section does not exist.
    pub fn section(&self, name: &str) -> Option<MappingSection> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables.as_ref()?.sections.get(name).cloned()
    }

    /// Names of all sections currently loaded.
    pub fn section_names(&self) -> Vec<String> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables
            .as_ref()
            .map(|file| file.sections.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl MappingData for JsonMappingData {
    fn is_loaded(&self) -> bool {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn load(&self) -> Result<(), LoadError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        let file: MappingFile =
            serde_json::from_str(&content).map_err(|source| LoadError::Parse {
                path: self.path.clone(),
                source,
            })?;

        debug!(
            "📥 Loaded {} mapping section(s) from {}",
            file.sections.len(),
            self.path.display()
        );
        *self.tables.write().unwrap_or_else(|e| e.into_inner()) = Some(file);
        Ok(())
    }

    fn unload(&self) {
        if self
            .tables
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .is_some()
        {
            debug!("📤 Unloaded mapping data from {}", self.path.display());
        }
    }

    fn residency(&self) -> &Residency {
        &self.residency
    }
}
