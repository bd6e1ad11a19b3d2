use std::fs;
use std::time::Duration;

use pretty_assertions::assert_eq;
use screenwatch_engine::{load_settings, save_settings, RecoveryConfig, SearchSettings};
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();

    assert_eq!(
        load_settings(&dir.path().join("settings.ron")),
        SearchSettings::default()
    );
}

#[test]
fn saved_settings_load_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config").join("settings.ron");
    let settings = SearchSettings {
        interval: Duration::from_millis(750),
        match_threshold: Some(0.75),
        recovery: RecoveryConfig {
            max_attempts: 5,
            backoff_base: Duration::from_millis(100),
            backoff_max: Duration::from_secs(3),
        },
    };

    save_settings(&path, &settings).unwrap();

    assert_eq!(load_settings(&path), settings);
}

#[test]
fn threshold_may_be_omitted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.ron");
    fs::write(
        &path,
        "(interval_ms: 1000, max_attempts: 2, backoff_base_ms: 250, backoff_max_ms: 1000)",
    )
    .unwrap();

    let settings = load_settings(&path);

    assert_eq!(settings.interval, Duration::from_secs(1));
    assert_eq!(settings.match_threshold, None);
    assert_eq!(settings.recovery.max_attempts, 2);
}

#[test]
fn malformed_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.ron");
    fs::write(&path, "interval_ms = 10").unwrap();

    assert_eq!(load_settings(&path), SearchSettings::default());
}

#[test]
fn invalid_values_yield_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.ron");
    fs::write(
        &path,
        "(interval_ms: 0, max_attempts: 3, backoff_base_ms: 500, backoff_max_ms: 8000)",
    )
    .unwrap();

    assert_eq!(load_settings(&path), SearchSettings::default());
}
