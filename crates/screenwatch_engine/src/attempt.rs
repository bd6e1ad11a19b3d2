use std::fmt;
use std::future::Future;
use std::sync::Arc;

use screenwatch_core::{CycleId, FailureCategory, Msg};
use tokio_util::sync::CancellationToken;
use watch_logging::{watch_debug, watch_info, watch_warn};

use crate::controller::{Directive, Inner};

/// One search attempt: template lookup, capture, then match.
///
/// Each step's outcome is reported back through the controller, which
/// decides whether to continue, retry after a delay, or abandon. The attempt
/// also stops as soon as `token` is cancelled.
pub(crate) async fn run(
    inner: Arc<Inner>,
    cycle: CycleId,
    threshold: Option<f32>,
    token: CancellationToken,
) {
    if token.is_cancelled() {
        return;
    }
    let template = match inner.check_template() {
        Ok(template) => template,
        Err(err) => {
            watch_warn!("Cycle {}: template unavailable: {}", cycle, err);
            inner.run(Msg::TemplateUnavailable {
                cycle,
                message: err.to_string(),
            });
            return;
        }
    };
    let template = match threshold {
        Some(threshold) => template.with_threshold(threshold),
        None => template,
    };

    let capturer = inner.collaborators.capturer.as_ref();
    let Some(snapshot) = with_recovery(&inner, cycle, FailureCategory::Capture, &token, || {
        capturer.capture()
    })
    .await
    else {
        return;
    };

    let directive = inner
        .run(Msg::StepSucceeded {
            cycle,
            category: FailureCategory::Capture,
        })
        .directive;
    if directive != Some(Directive::Continue) {
        watch_debug!("Cycle {} abandoned after capture", cycle);
        return;
    }

    let matcher = inner.collaborators.matcher.as_ref();
    let Some(result) = with_recovery(&inner, cycle, FailureCategory::Match, &token, || {
        matcher.find(&snapshot, &template)
    })
    .await
    else {
        return;
    };

    if let Some(at) = result.coordinates() {
        watch_info!(
            "Cycle {}: match at ({}, {}) confidence {:.3}",
            cycle,
            at.x,
            at.y,
            result.confidence()
        );
    }
    inner.run(Msg::AttemptFinished { cycle, result });
}

/// Runs `step` until it succeeds, the controller stops granting retries, or
/// the attempt is cancelled.
async fn with_recovery<T, E, F, Fut>(
    inner: &Arc<Inner>,
    cycle: CycleId,
    category: FailureCategory,
    token: &CancellationToken,
    mut step: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    loop {
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => return None,
            outcome = step() => outcome,
        };

        let message = match outcome {
            Ok(value) => return Some(value),
            Err(err) => err.to_string(),
        };
        watch_warn!("Cycle {}: {} failed: {}", cycle, category, message);

        let directive = inner
            .run(Msg::StepFailed {
                cycle,
                category,
                message,
            })
            .directive;
        let Some(Directive::Retry(delay)) = directive else {
            return None;
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
