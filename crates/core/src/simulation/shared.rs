//! Process-wide engine
//!
//! Host applications build the engine once and reuse it for every request. The
//! [`EngineCell`] makes that lifecycle explicit: the first access loads the engine,
//! every later access returns the same instance, and a failed load is remembered as
//! [`EngineAvailability::Offline`] rather than retried or propagated as a panic.
//!
//! The ready engine sits behind an `RwLock`. Simulations only need a read guard;
//! parameter edits take the write guard and must come from a single writer.

use super::{PersistenceError, WaterTwinEngine};
use std::path::Path;
use std::sync::{OnceLock, RwLock};
use tracing::error;

/// Result of the one-time engine load
#[derive(Debug)]
pub enum EngineAvailability {
    /// Engine loaded and usable
    Ready(RwLock<WaterTwinEngine>),
    /// Engine could not be loaded; the host should report it as offline
    Offline {
        /// Why the load failed
        reason: String,
    },
}

impl EngineAvailability {
    /// The engine, if it loaded
    pub fn engine(&self) -> Option<&RwLock<WaterTwinEngine>> {
        match self {
            EngineAvailability::Ready(engine) => Some(engine),
            EngineAvailability::Offline { .. } => None,
        }
    }

    /// Whether the engine is usable
    pub fn is_ready(&self) -> bool {
        matches!(self, EngineAvailability::Ready(_))
    }
}

/// Construct-once, reuse-forever holder for an engine
#[derive(Debug, Default)]
pub struct EngineCell {
    slot: OnceLock<EngineAvailability>,
}

impl EngineCell {
    /// Create an empty cell
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /// Return the engine, running `load` on first access only
    pub fn get_or_init_with<F>(&self, load: F) -> &EngineAvailability
    where
        F: FnOnce() -> Result<WaterTwinEngine, PersistenceError>,
    {
        self.slot.get_or_init(|| match load() {
            Ok(engine) => EngineAvailability::Ready(RwLock::new(engine)),
            Err(e) => {
                error!("Engine offline: {e}");
                EngineAvailability::Offline {
                    reason: e.to_string(),
                }
            }
        })
    }

    /// Return the engine, loading the snapshot at `path` on first access only
    pub fn get_or_load<P: AsRef<Path>>(&self, path: P) -> &EngineAvailability {
        self.get_or_init_with(|| WaterTwinEngine::load(path))
    }

    /// The engine state if a load has already happened
    pub fn get(&self) -> Option<&EngineAvailability> {
        self.slot.get()
    }
}

static GLOBAL_ENGINE: EngineCell = EngineCell::new();

/// The process-wide engine, loaded from `path` on first call
///
/// Later calls ignore `path` and return whatever the first call produced.
pub fn global_engine<P: AsRef<Path>>(path: P) -> &'static EngineAvailability {
    GLOBAL_ENGINE.get_or_load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SystemConfig;
    use crate::forecast::ConstantPredictor;
    use std::cell::Cell;

    fn engine() -> WaterTwinEngine {
        let config = SystemConfig::new(100.0, 5000.0, 0.8, 0.1, 15.0).unwrap();
        WaterTwinEngine::new(config, Box::new(ConstantPredictor::fallback()))
    }

    #[test]
    fn test_loads_once() {
        let cell = EngineCell::new();
        let calls = Cell::new(0);

        for _ in 0..3 {
            let state = cell.get_or_init_with(|| {
                calls.set(calls.get() + 1);
                Ok(engine())
            });
            assert!(state.is_ready());
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_offline_is_remembered() {
        let cell = EngineCell::new();
        let missing = std::env::temp_dir().join("watertwin_cell_missing_engine.json");
        let _ = std::fs::remove_file(&missing);

        let state = cell.get_or_load(&missing);
        assert!(!state.is_ready());
        assert!(state.engine().is_none());
        match state {
            EngineAvailability::Offline { reason } => assert!(reason.contains("Failed to load")),
            EngineAvailability::Ready(_) => panic!("expected offline engine"),
        }

        // A later successful loader is never consulted
        let state = cell.get_or_init_with(|| Ok(engine()));
        assert!(!state.is_ready());
    }

    #[test]
    fn test_parameter_edits_visible_to_readers() {
        let cell = EngineCell::new();
        assert!(cell.get().is_none());

        let state = cell.get_or_init_with(|| Ok(engine()));
        let lock = state.engine().unwrap();

        lock.write().unwrap().set_tank_capacity(10000.0).unwrap();

        let result = lock.read().unwrap().run_simulation(25.0, 40.0, 25.0);
        // start = 4000, inflow = 1800, usage = 300 → 5500 / 10000
        assert_eq!(*result.final_fill_pct, 55.0);
        assert!(cell.get().is_some());
    }
}
