use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;
use thiserror::Error;
use watch_logging::watch_debug;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("not a usable directory: {0}")]
    OutputDir(String),
    #[error("could not serialize: {0}")]
    Serialize(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Creates `dir` and its parents when missing. Fails if the path exists but
/// is not a directory.
pub fn ensure_dir(dir: &Path) -> Result<(), PersistError> {
    fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(format!("{dir:?}: {e}")))?;
    if !dir.is_dir() {
        return Err(PersistError::OutputDir(format!("{dir:?} is not a directory")));
    }
    Ok(())
}

/// Writes whole files inside one directory so readers see either the old
/// content or the new, never a partial write.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Stages `content` in a hidden sibling temp file, syncs it and renames it
    /// over `{dir}/{filename}`. Returns the final path.
    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_dir(&self.dir)?;

        let mut staged = Builder::new()
            .prefix(&format!(".{filename}."))
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;
        staged.write_all(content)?;
        staged.as_file().sync_all()?;

        let target = self.dir.join(filename);
        staged
            .persist(&target)
            .map_err(|err| PersistError::Io(err.error))?;
        watch_debug!("Wrote {} bytes to {:?}", content.len(), target);
        Ok(target)
    }
}
