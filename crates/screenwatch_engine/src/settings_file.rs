use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use screenwatch_core::{RecoveryConfig, SearchSettings};
use serde::{Deserialize, Serialize};
use watch_logging::{watch_info, watch_warn};

use crate::{AtomicFileWriter, PersistError};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSettings {
    interval_ms: u64,
    #[serde(default)]
    match_threshold: Option<f32>,
    max_attempts: u32,
    backoff_base_ms: u64,
    backoff_max_ms: u64,
}

impl From<&SearchSettings> for PersistedSettings {
    fn from(settings: &SearchSettings) -> Self {
        Self {
            interval_ms: duration_ms(settings.interval),
            match_threshold: settings.match_threshold,
            max_attempts: settings.recovery.max_attempts,
            backoff_base_ms: duration_ms(settings.recovery.backoff_base),
            backoff_max_ms: duration_ms(settings.recovery.backoff_max),
        }
    }
}

impl From<PersistedSettings> for SearchSettings {
    fn from(persisted: PersistedSettings) -> Self {
        Self {
            interval: Duration::from_millis(persisted.interval_ms),
            match_threshold: persisted.match_threshold,
            recovery: RecoveryConfig {
                max_attempts: persisted.max_attempts,
                backoff_base: Duration::from_millis(persisted.backoff_base_ms),
                backoff_max: Duration::from_millis(persisted.backoff_max_ms),
            },
        }
    }
}

/// Reads settings from a RON file. Anything short of a readable, valid file
/// falls back to the defaults.
pub fn load_settings(path: &Path) -> SearchSettings {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return SearchSettings::default();
        }
        Err(err) => {
            watch_warn!("Failed to read settings from {:?}: {}", path, err);
            return SearchSettings::default();
        }
    };

    let persisted: PersistedSettings = match ron::from_str(&content) {
        Ok(persisted) => persisted,
        Err(err) => {
            watch_warn!("Failed to parse settings from {:?}: {}", path, err);
            return SearchSettings::default();
        }
    };

    let settings = SearchSettings::from(persisted);
    if let Err(err) = settings.validate() {
        watch_warn!("Ignoring settings from {:?}: {}", path, err);
        return SearchSettings::default();
    }

    watch_info!("Loaded settings from {:?}", path);
    settings
}

pub fn save_settings(path: &Path, settings: &SearchSettings) -> Result<(), PersistError> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| PersistError::OutputDir(format!("not a file path: {path:?}")))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(&PersistedSettings::from(settings), pretty)
        .map_err(|err| PersistError::Serialize(err.to_string()))?;

    AtomicFileWriter::new(dir).write(filename, content.as_bytes())?;
    Ok(())
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
