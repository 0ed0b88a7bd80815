//! Registry of loaded rails, keyed by field name
//!
//! Scanners take a `&RailStore`; the cache hands out `Arc<RailStore>` so a
//! store stays alive for in-flight scans after it has been replaced by a
//! newer generation. Each field has its own slot lock, so building one
//! field never blocks readers of another.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use railstat_core::{IndexSnapshot, RailResult};
use tracing::debug;

use super::store::RailStore;
use crate::config::RailConfig;
use crate::scan::ScanOptions;

type Slot = Arc<Mutex<Option<Arc<RailStore>>>>;

/// In-process registry of loaded rails.
#[derive(Debug, Default)]
pub struct RailCache {
    config: RailConfig,
    slots: Mutex<HashMap<String, Slot>>,
}

impl RailCache {
    /// Empty cache using `config` for every build-or-load.
    pub fn new(config: RailConfig) -> Self {
        RailCache {
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Configuration used by this cache.
    pub fn config(&self) -> &RailConfig {
        &self.config
    }

    /// Scan options selecting every document with the configured strategy.
    ///
    /// The config was validated when loaded from file; a hand-built config
    /// with an unknown strategy is reported here.
    pub fn scan_options(&self) -> RailResult<ScanOptions<'static>> {
        ScanOptions::from_config(&self.config)
    }

    /// Store for `field` at the generation of `index`.
    ///
    /// A cached store of another generation is never returned: it is
    /// replaced by build-or-load, performed once per field even when many
    /// threads ask concurrently.
    pub fn get(&self, field: &str, index: &dyn IndexSnapshot) -> RailResult<Arc<RailStore>> {
        let slot = {
            let mut slots = self.slots.lock();
            slots.entry(field.to_string()).or_default().clone()
        };

        let mut entry = slot.lock();
        if let Some(store) = entry.as_ref() {
            if !store.is_stale(index) {
                return Ok(Arc::clone(store));
            }
            debug!(
                target: "railstat::rail",
                field,
                cached = %store.generation(),
                live = %index.generation(),
                "Cached rail is stale"
            );
        }
        let store = Arc::new(RailStore::for_field_with_config(field, index, &self.config)?);
        *entry = Some(Arc::clone(&store));
        Ok(store)
    }

    /// Drop the cached store of `field`. Returns true if one was cached.
    pub fn invalidate(&self, field: &str) -> bool {
        let slot = self.slots.lock().remove(field);
        slot.map_or(false, |s| s.lock().is_some())
    }

    /// Number of fields with a cached store.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = self.slots.lock().values().cloned().collect();
        slots.iter().filter(|s| s.lock().is_some()).count()
    }

    /// True when no store is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
