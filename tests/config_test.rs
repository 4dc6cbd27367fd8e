//! Tests for the sample configuration file

use pinwheel::config::Config;
use pinwheel::rotation::SelectionStrategy;
use std::path::{Path, PathBuf};

fn sample_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("pinwheel.toml")
}

#[test]
fn test_sample_config_matches_defaults() {
    let config = Config::from_file(&sample_path()).expect("pinwheel.toml should parse");
    assert_eq!(config, Config::default());
    config.validate().unwrap();
}

#[test]
fn test_sample_config_sections() {
    let config = Config::from_file(&sample_path()).unwrap();

    assert_eq!(config.catalog.directory, PathBuf::from("imagequeue"));
    assert_eq!(config.storage.max_bytes, 50 * 1024);
    assert_eq!(config.clustering.window, 4);
    assert_eq!(config.selection.strategy, SelectionStrategy::Uniform);

    let names: Vec<&str> = config.seasonal.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["halloween", "christmas"]);
}

#[test]
fn test_missing_file_is_error() {
    let err = Config::from_file(Path::new("does/not/exist.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_unknown_strategy_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[selection]\nstrategy = \"loudest\"\n").unwrap();
    assert!(Config::from_file(&path).is_err());
}
