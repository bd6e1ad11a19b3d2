use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use screenwatch_core::SearchResult;

use crate::{CaptureError, Clock, MatchError, Template, TemplateError};

/// One captured frame. The payload format is agreed between capturer and matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub image: Bytes,
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(image: impl Into<Bytes>) -> Self {
        Self {
            image: image.into(),
            captured_at: Utc::now(),
        }
    }
}

#[async_trait::async_trait]
pub trait Capturer: Send + Sync {
    async fn capture(&self) -> Result<Snapshot, CaptureError>;

    /// Acquire whatever the capturer needs before the first capture of a run.
    fn prepare(&self) -> Result<(), CaptureError> {
        Ok(())
    }

    /// Give back resources held since `prepare`.
    fn release(&self) -> Result<(), CaptureError> {
        Ok(())
    }
}

#[async_trait::async_trait]
pub trait Matcher: Send + Sync {
    async fn find(
        &self,
        snapshot: &Snapshot,
        template: &Template,
    ) -> Result<SearchResult, MatchError>;
}

pub trait TemplateStore: Send + Sync {
    fn active(&self) -> Option<Template>;

    fn validate(&self, template: &Template) -> Result<(), TemplateError> {
        template.check()
    }
}

/// Delivers results to the user. Called off the controller's threads; the
/// controller never observes the outcome.
pub trait Notifier: Send + Sync {
    fn notify(&self, result: &SearchResult);
}

#[derive(Clone)]
pub struct Collaborators {
    pub capturer: Arc<dyn Capturer>,
    pub matcher: Arc<dyn Matcher>,
    pub templates: Arc<dyn TemplateStore>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}
