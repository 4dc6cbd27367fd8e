//! Common test utilities

use chrono::NaiveDate;
use pinwheel::config::Config;
use pinwheel::rotation::RotationEngine;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use tempfile::TempDir;

/// Configuration with both state documents inside `dir`
#[allow(dead_code)]
pub fn config_in(dir: &Path) -> Config {
    let mut config = Config::default();
    config.catalog.directory = dir.join("imagequeue");
    config.storage.state_path = dir.join("state").join("rotation_state.json");
    config.storage.history_path = dir.join("state").join("recent_emissions.json");
    config
}

/// Engine with both state documents inside `dir`
#[allow(dead_code)]
pub fn engine_in(dir: &Path) -> RotationEngine {
    RotationEngine::new(&config_in(dir))
}

/// Temp workspace with an `imagequeue/` directory holding empty media files
#[allow(dead_code)]
pub fn workspace_with(names: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    let queue = dir.path().join("imagequeue");
    std::fs::create_dir_all(&queue).unwrap();
    for name in names {
        std::fs::write(queue.join(name), b"").unwrap();
    }
    dir
}

/// Seeded randomness for reproducible selections
#[allow(dead_code)]
pub fn seeded(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

#[allow(dead_code)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
