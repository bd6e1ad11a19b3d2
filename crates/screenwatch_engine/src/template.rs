use bytes::Bytes;
use chrono::{DateTime, Utc};
use screenwatch_core::Point;

use crate::TemplateError;

/// A previously captured reference region plus the parameters used to match it.
///
/// The image payload is opaque to the engine; only the matcher interprets it.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub center: Point,
    pub radius: u32,
    pub match_threshold: f32,
    pub created_at: DateTime<Utc>,
    pub image: Bytes,
}

impl Template {
    pub fn new(
        center: Point,
        radius: u32,
        match_threshold: f32,
        image: impl Into<Bytes>,
    ) -> Result<Self, TemplateError> {
        let template = Self {
            center,
            radius,
            match_threshold,
            created_at: Utc::now(),
            image: image.into(),
        };
        template.check()?;
        Ok(template)
    }

    pub fn check(&self) -> Result<(), TemplateError> {
        if !(self.match_threshold > 0.0 && self.match_threshold <= 1.0) {
            return Err(TemplateError::Invalid(format!(
                "match threshold {} outside (0, 1]",
                self.match_threshold
            )));
        }
        if self.radius == 0 {
            return Err(TemplateError::Invalid("radius must be positive".into()));
        }
        if self.image.is_empty() {
            return Err(TemplateError::Invalid("image payload is empty".into()));
        }
        Ok(())
    }

    pub fn with_threshold(&self, match_threshold: f32) -> Self {
        Self {
            match_threshold,
            ..self.clone()
        }
    }
}
