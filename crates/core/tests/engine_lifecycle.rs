//! Engine persistence and the process-wide engine cell, exercised the way a host
//! application uses them: build, persist, reload once, edit parameters, simulate.

use std::fs;
use std::path::PathBuf;
use watertwin_core::{
    global_engine, ArtifactPredictor, EngineAvailability, EngineCell, ForecastArtifact,
    SystemConfig, TankStatus, WaterTwinEngine,
};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("watertwin_lifecycle_{name}"))
}

fn regression_engine() -> WaterTwinEngine {
    let config = SystemConfig::new(120.0, 6000.0, 0.85, 0.05, 20.0).unwrap();
    let predictor = ArtifactPredictor::new(ForecastArtifact::reference().unwrap()).unwrap();
    WaterTwinEngine::new(config, Box::new(predictor))
}

#[test]
fn test_host_reuses_persisted_engine() {
    let path = temp_path("engine.json");
    let engine = regression_engine();
    engine.save(&path).unwrap();

    let cell = EngineCell::new();
    let expected = engine.run_simulation(12.0, 35.0, 28.0);

    // First interaction loads the snapshot
    let lock = cell.get_or_load(&path).engine().unwrap();
    assert_eq!(lock.read().unwrap().run_simulation(12.0, 35.0, 28.0), expected);

    // Deleting the file doesn't matter any more: the engine is never reloaded
    let _ = fs::remove_file(&path);
    let again = cell.get_or_load(&path);
    assert!(again.is_ready());

    // The sidebar edits parameters through the single writer
    {
        let mut writer = lock.write().unwrap();
        writer.set_roof_area(240.0).unwrap();
        assert!(writer.set_tank_capacity(-1.0).is_err());
    }
    let edited = lock.read().unwrap().run_simulation(12.0, 35.0, 28.0);
    assert!(edited.inflow_l > expected.inflow_l);
    assert_eq!(*lock.read().unwrap().parameters().tank_capacity(), 6000.0);
}

#[test]
fn test_corrupt_snapshot_reports_offline() {
    let path = temp_path("corrupt_engine.json");
    fs::write(&path, "{ \"config\": 42 }").unwrap();

    let cell = EngineCell::new();
    match cell.get_or_load(&path) {
        EngineAvailability::Offline { reason } => {
            assert!(reason.starts_with("Failed to parse"), "{reason}");
        }
        EngineAvailability::Ready(_) => panic!("corrupt snapshot must not load"),
    }

    let _ = fs::remove_file(&path);
}

#[test]
fn test_global_engine_is_constructed_once() {
    let path = temp_path("global_engine.json");
    regression_engine().save(&path).unwrap();

    let first = global_engine(&path);
    assert!(first.is_ready());

    // Later callers get the same instance regardless of the path they pass
    let second = global_engine(temp_path("does_not_exist.json"));
    assert!(std::ptr::eq(first, second));

    let result = second
        .engine()
        .unwrap()
        .read()
        .unwrap()
        .run_simulation(0.0, 10.0, 25.0);
    // 600 L start minus the 440 L forecast → 160 L of 6000 L
    assert_eq!(*result.final_fill_pct, 2.7);
    assert_eq!(result.status, TankStatus::CriticalLow);

    let _ = fs::remove_file(&path);
}
