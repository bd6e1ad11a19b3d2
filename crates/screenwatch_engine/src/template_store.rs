use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use screenwatch_core::Point;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use watch_logging::{watch_info, watch_warn};

use crate::{AtomicFileWriter, Template, TemplateError, TemplateStore};

const META_FILENAME: &str = "template.json";
const IMAGE_FILENAME: &str = "template.bin";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredTemplate {
    center_x: i32,
    center_y: i32,
    radius: u32,
    match_threshold: f32,
    created_at: DateTime<Utc>,
    sha256: String,
}

/// Keeps the active template in a directory: JSON metadata next to the raw
/// image payload, tied together by the payload's SHA-256 digest.
#[derive(Debug, Clone)]
pub struct FileTemplateStore {
    dir: PathBuf,
}

impl FileTemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Replaces the stored template. The payload is written before the
    /// metadata so a crash in between leaves a digest mismatch, not a
    /// silently wrong template.
    pub fn save(&self, template: &Template) -> Result<(), TemplateError> {
        template.check()?;
        let stored = StoredTemplate {
            center_x: template.center.x,
            center_y: template.center.y,
            radius: template.radius,
            match_threshold: template.match_threshold,
            created_at: template.created_at,
            sha256: digest(&template.image),
        };
        let meta = serde_json::to_vec_pretty(&stored)?;

        let writer = AtomicFileWriter::new(self.dir.clone());
        writer.write(IMAGE_FILENAME, &template.image)?;
        writer.write(META_FILENAME, &meta)?;
        watch_info!(
            "Saved template ({} bytes) to {:?}",
            template.image.len(),
            self.dir
        );
        Ok(())
    }

    pub fn load(&self) -> Result<Template, TemplateError> {
        let meta = match fs::read(self.dir.join(META_FILENAME)) {
            Ok(meta) => meta,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(TemplateError::Missing)
            }
            Err(err) => return Err(err.into()),
        };
        let stored: StoredTemplate = serde_json::from_slice(&meta)
            .map_err(|err| TemplateError::Corrupt(format!("metadata: {err}")))?;

        let image = match fs::read(self.dir.join(IMAGE_FILENAME)) {
            Ok(image) => image,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(TemplateError::Corrupt("image payload missing".into()))
            }
            Err(err) => return Err(err.into()),
        };
        if digest(&image) != stored.sha256 {
            return Err(TemplateError::Corrupt("image digest mismatch".into()));
        }

        Ok(Template {
            center: Point::new(stored.center_x, stored.center_y),
            radius: stored.radius,
            match_threshold: stored.match_threshold,
            created_at: stored.created_at,
            image: Bytes::from(image),
        })
    }

    /// Removes the stored template. Clearing an empty store is not an error.
    pub fn clear(&self) -> Result<(), TemplateError> {
        for name in [META_FILENAME, IMAGE_FILENAME] {
            match fs::remove_file(self.dir.join(name)) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}

impl TemplateStore for FileTemplateStore {
    fn active(&self) -> Option<Template> {
        match self.load() {
            Ok(template) => Some(template),
            Err(TemplateError::Missing) => None,
            Err(err) => {
                watch_warn!("Failed to load template from {:?}: {}", self.dir, err);
                None
            }
        }
    }
}

fn digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
