use std::time::Instant;

use pretty_assertions::assert_eq;
use screenwatch_core::{
    update, ControllerState, FailureCategory, Msg, Point, SearchResult, SearchState,
};

fn step(state: &ControllerState, msg: Msg) -> ControllerState {
    update(state.clone(), msg, Instant::now()).0
}

/// One state per phase, reached through ordinary transitions.
fn every_phase() -> Vec<ControllerState> {
    let stopped = ControllerState::new();
    let starting = step(&stopped, Msg::StartRequested { template: Ok(()) });
    let active = step(&starting, Msg::SetupFinished(Ok(())));
    let pausing = step(&active, Msg::PauseRequested);
    let paused = step(&pausing, Msg::PauseFinished(Ok(())));
    let resuming = step(&paused, Msg::ResumeRequested);
    let stopping = step(&active, Msg::StopRequested);
    let error = step(&starting, Msg::SetupFinished(Err("no display".into())));

    let states = vec![
        stopped, starting, active, pausing, paused, resuming, stopping, error,
    ];
    let phases: Vec<SearchState> = states.iter().map(ControllerState::phase).collect();
    assert_eq!(
        phases,
        vec![
            SearchState::Stopped,
            SearchState::Starting,
            SearchState::Active,
            SearchState::Pausing,
            SearchState::Paused,
            SearchState::Resuming,
            SearchState::Stopping,
            SearchState::Error,
        ]
    );
    states
}

fn reports_for(cycle: u64) -> Vec<Msg> {
    vec![
        Msg::TickFired { cycle },
        Msg::TemplateUnavailable {
            cycle,
            message: "gone".into(),
        },
        Msg::StepSucceeded {
            cycle,
            category: FailureCategory::Capture,
        },
        Msg::StepFailed {
            cycle,
            category: FailureCategory::Match,
            message: "busy".into(),
        },
        Msg::AttemptFinished {
            cycle,
            result: SearchResult::found(Point::new(1, 1), 0.9).unwrap(),
        },
    ]
}

#[test]
fn reports_from_another_cycle_are_inert_in_every_phase() {
    let now = Instant::now();
    for state in every_phase() {
        let other = state.cycle().wrapping_add(1);
        for msg in reports_for(other) {
            let (next, effects) = update(state.clone(), msg.clone(), now);
            assert_eq!(next, state, "{msg:?} changed {}", state.phase());
            assert!(effects.is_empty(), "{msg:?} in {} produced effects", state.phase());
        }
    }
}

#[test]
fn completions_outside_their_phase_are_inert() {
    let now = Instant::now();
    let completions = [
        (SearchState::Starting, Msg::SetupFinished(Ok(()))),
        (SearchState::Pausing, Msg::PauseFinished(Ok(()))),
        (SearchState::Resuming, Msg::ResumeFinished(Ok(()))),
        (SearchState::Stopping, Msg::TeardownFinished(Ok(()))),
        (SearchState::Starting, Msg::SetupFinished(Err("late".into()))),
        (SearchState::Stopping, Msg::TeardownFinished(Err("late".into()))),
    ];

    for state in every_phase() {
        for (expected_in, msg) in &completions {
            if state.phase() == *expected_in {
                continue;
            }
            let (next, effects) = update(state.clone(), msg.clone(), now);
            assert_eq!(next, state, "{msg:?} changed {}", state.phase());
            assert!(effects.is_empty());
        }
    }
}

#[test]
fn step_reports_without_an_attempt_in_flight_are_inert() {
    let stopped = ControllerState::new();
    let starting = step(&stopped, Msg::StartRequested { template: Ok(()) });
    let active = step(&starting, Msg::SetupFinished(Ok(())));
    assert!(!active.attempt_in_flight());

    for msg in reports_for(active.cycle()).into_iter().skip(1) {
        let (next, effects) = update(active.clone(), msg, Instant::now());
        assert_eq!(next, active);
        assert!(effects.is_empty());
    }
}
