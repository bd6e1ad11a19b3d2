use std::time::Duration;

use crate::{ControlError, RecoveryConfig};

/// Tunables for a running search. Changes apply at the next tick boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    pub interval: Duration,
    /// Replaces the template's own threshold when set.
    pub match_threshold: Option<f32>,
    pub recovery: RecoveryConfig,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            match_threshold: None,
            recovery: RecoveryConfig::default(),
        }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.interval.is_zero() {
            return Err(ControlError::InvalidSettings(
                "interval must be greater than zero".into(),
            ));
        }
        if let Some(threshold) = self.match_threshold {
            if !(threshold > 0.0 && threshold <= 1.0) {
                return Err(ControlError::InvalidSettings(format!(
                    "match threshold {threshold} outside (0, 1]"
                )));
            }
        }
        if self.recovery.max_attempts == 0 {
            return Err(ControlError::InvalidSettings(
                "max attempts must be at least 1".into(),
            ));
        }
        if self.recovery.backoff_base > self.recovery.backoff_max {
            return Err(ControlError::InvalidSettings(
                "backoff base exceeds backoff cap".into(),
            ));
        }
        Ok(())
    }
}
