use std::time::{Duration, Instant};

use crate::{
    ControlError, ControllerState, Effect, FailureCategory, LifecycleEvent, Msg, Operation,
    RecoveryDecision, SearchState,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Requests that are illegal in the current state produce a single
/// `Effect::Rejected` and leave the state untouched. Completions that belong
/// to an abandoned cycle, or that arrive in a state that no longer expects
/// them, are dropped without effects.
pub fn update(
    mut state: ControllerState,
    msg: Msg,
    now: Instant,
) -> (ControllerState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartRequested { template } => match state.phase() {
            SearchState::Stopped | SearchState::Error => match template {
                Ok(()) => {
                    state.reset_run();
                    state.next_cycle();
                    let mut effects = Vec::with_capacity(2);
                    enter(&mut state, SearchState::Starting, now, &mut effects);
                    effects.push(Effect::PrepareSearch);
                    effects
                }
                Err(message) => vec![Effect::Rejected(ControlError::MissingTemplate(message))],
            },
            from => reject(from, Operation::Start),
        },
        Msg::SetupFinished(outcome) => match (state.phase(), outcome) {
            (SearchState::Starting, Ok(())) => {
                become_active(&mut state, LifecycleEvent::Started, now)
            }
            (SearchState::Starting, Err(reason)) => {
                fail(&mut state, format!("setup failed: {reason}"), now)
            }
            _ => Vec::new(),
        },
        Msg::PauseRequested => match state.phase() {
            SearchState::Active => {
                state.next_cycle();
                let mut effects = vec![Effect::CancelPending];
                enter(&mut state, SearchState::Pausing, now, &mut effects);
                effects.push(Effect::ReleaseResources);
                effects
            }
            from => reject(from, Operation::Pause),
        },
        Msg::PauseFinished(outcome) => match (state.phase(), outcome) {
            (SearchState::Pausing, Ok(())) => {
                let mut effects = vec![Effect::Emit(LifecycleEvent::Paused)];
                enter(&mut state, SearchState::Paused, now, &mut effects);
                effects
            }
            (SearchState::Pausing, Err(reason)) => {
                fail(&mut state, format!("pause cleanup failed: {reason}"), now)
            }
            _ => Vec::new(),
        },
        Msg::ResumeRequested => match state.phase() {
            SearchState::Paused => {
                let mut effects = Vec::with_capacity(2);
                enter(&mut state, SearchState::Resuming, now, &mut effects);
                effects.push(Effect::ReacquireResources);
                effects
            }
            from => reject(from, Operation::Resume),
        },
        Msg::ResumeFinished(outcome) => match (state.phase(), outcome) {
            (SearchState::Resuming, Ok(())) => {
                become_active(&mut state, LifecycleEvent::Resumed, now)
            }
            (SearchState::Resuming, Err(reason)) => {
                fail(&mut state, format!("resume failed: {reason}"), now)
            }
            _ => Vec::new(),
        },
        Msg::StopRequested => match state.phase() {
            // Already stopped, or another caller's teardown is in progress.
            SearchState::Stopped | SearchState::Stopping => Vec::new(),
            SearchState::Error => leave_error(&mut state, now),
            _ => {
                state.next_cycle();
                let mut effects = vec![Effect::CancelPending];
                enter(&mut state, SearchState::Stopping, now, &mut effects);
                effects.push(Effect::Teardown);
                effects
            }
        },
        Msg::TeardownFinished(outcome) => match (state.phase(), outcome) {
            (SearchState::Stopping, Ok(())) => {
                let mut effects = vec![Effect::Emit(LifecycleEvent::Stopped)];
                enter(&mut state, SearchState::Stopped, now, &mut effects);
                effects
            }
            (SearchState::Stopping, Err(reason)) => {
                fail(&mut state, format!("teardown failed: {reason}"), now)
            }
            _ => Vec::new(),
        },
        Msg::ResetRequested => match state.phase() {
            SearchState::Error => leave_error(&mut state, now),
            from => reject(from, Operation::Reset),
        },
        Msg::SettingsChanged(settings) => match settings.validate() {
            Ok(()) => {
                state.change_settings(settings);
                Vec::new()
            }
            Err(err) => vec![Effect::Rejected(err)],
        },
        Msg::TickFired { cycle } => {
            if state.phase() == SearchState::Active
                && state.cycle() == cycle
                && !state.attempt_in_flight()
            {
                state.begin_attempt();
                vec![Effect::RunAttempt {
                    cycle,
                    threshold: state.settings().match_threshold,
                }]
            } else {
                Vec::new()
            }
        }
        Msg::TemplateUnavailable { cycle, message } => {
            if !state.is_current(cycle) {
                return (state, Vec::new());
            }
            fail(&mut state, format!("template unavailable: {message}"), now)
        }
        Msg::StepSucceeded { cycle, category } => {
            if !state.is_current(cycle) {
                return (state, Vec::new());
            }
            state.recovery_mut().record_success(category);
            vec![Effect::ContinueAttempt { cycle }]
        }
        Msg::StepFailed {
            cycle,
            category,
            message,
        } => {
            if !state.is_current(cycle) {
                return (state, Vec::new());
            }
            let config = state.settings().recovery;
            match state.recovery_mut().record_failure(category, now, &config) {
                RecoveryDecision::Retry { delay, .. } => vec![Effect::RetryStep {
                    cycle,
                    category,
                    delay,
                }],
                RecoveryDecision::GiveUp { attempts } => {
                    let err = ControlError::TerminalFailure {
                        category,
                        attempts,
                        message,
                    };
                    fail(&mut state, err.to_string(), now)
                }
            }
        }
        Msg::AttemptFinished { cycle, result } => {
            if !state.is_current(cycle) {
                return (state, Vec::new());
            }
            state.recovery_mut().record_success(FailureCategory::Match);
            state.record_result(result);
            state.end_attempt();

            let mut effects = Vec::with_capacity(3);
            if result.is_found() {
                effects.push(Effect::Notify(result));
                effects.push(Effect::Emit(LifecycleEvent::ResultFound(result)));
            }
            effects.push(Effect::ScheduleTick {
                cycle,
                delay: state.settings().interval,
            });
            effects
        }
    };

    (state, effects)
}

fn reject(from: SearchState, operation: Operation) -> Vec<Effect> {
    vec![Effect::Rejected(ControlError::InvalidTransition {
        from,
        operation,
    })]
}

fn enter(state: &mut ControllerState, phase: SearchState, now: Instant, effects: &mut Vec<Effect>) {
    state.set_phase(phase, now);
    effects.push(Effect::Emit(LifecycleEvent::StateChanged(phase)));
}

/// The first tick of a fresh or resumed run fires immediately.
fn become_active(state: &mut ControllerState, event: LifecycleEvent, now: Instant) -> Vec<Effect> {
    let mut effects = vec![Effect::Emit(event)];
    enter(state, SearchState::Active, now, &mut effects);
    effects.push(Effect::ScheduleTick {
        cycle: state.cycle(),
        delay: Duration::ZERO,
    });
    effects
}

fn fail(state: &mut ControllerState, message: String, now: Instant) -> Vec<Effect> {
    state.next_cycle();
    state.set_last_error(message.clone());
    let mut effects = vec![
        Effect::CancelPending,
        Effect::Emit(LifecycleEvent::Error(message)),
    ];
    enter(state, SearchState::Error, now, &mut effects);
    effects
}

fn leave_error(state: &mut ControllerState, now: Instant) -> Vec<Effect> {
    state.recovery_mut().reset();
    state.next_cycle();
    let mut effects = vec![Effect::Emit(LifecycleEvent::Stopped)];
    enter(state, SearchState::Stopped, now, &mut effects);
    effects
}
