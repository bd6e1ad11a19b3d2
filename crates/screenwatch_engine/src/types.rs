use std::io;

use thiserror::Error;

use crate::PersistError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("capture source unavailable: {0}")]
    Unavailable(String),
    #[error("capture permission revoked")]
    PermissionDenied,
    #[error("capture failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("snapshot could not be decoded: {0}")]
    Decode(String),
    #[error("template larger than snapshot")]
    TemplateTooLarge,
    #[error("matcher failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("no template has been saved")]
    Missing,
    #[error("template is invalid: {0}")]
    Invalid(String),
    #[error("template is corrupt: {0}")]
    Corrupt(String),
    #[error("template metadata malformed: {0}")]
    Format(#[from] serde_json::Error),
    #[error("could not write template: {0}")]
    Persist(#[from] PersistError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
