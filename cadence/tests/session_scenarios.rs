use cadence::duration::parse_clock;
use cadence::{
    Cue, MemoryStore, Mode, RunState, SessionController, SessionError, SessionSettings, Signal,
    TickOutcome, HISTORY_LIMIT,
};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Chimes(Arc<Mutex<Vec<Cue>>>);

impl Chimes {
    fn labels(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(|c| c.label.clone()).collect()
    }
}

impl Signal for Chimes {
    fn play_end_of_phase(&mut self, cue: &Cue) {
        self.0.lock().unwrap().push(cue.clone());
    }
}

fn session_with(loop_enabled: bool) -> (SessionController, Chimes) {
    let chimes = Chimes::default();
    let session = SessionController::new(
        Box::new(MemoryStore::new()),
        Box::new(chimes.clone()),
        SessionSettings {
            loop_enabled,
            ..SessionSettings::default()
        },
    );
    (session, chimes)
}

/// Tick until something other than counting happens.
fn run_until_event(session: &mut SessionController) -> (u64, TickOutcome) {
    let mut ticks = 0;
    loop {
        ticks += 1;
        let outcome = session.tick();
        if outcome != TickOutcome::Counting {
            return (ticks, outcome);
        }
        assert!(ticks <= 24 * 3600, "timer never completed");
    }
}

#[test]
fn single_timer_runs_to_completion_and_resets() {
    let (mut session, chimes) = session_with(true);
    session.start().unwrap();

    let (ticks, outcome) = run_until_event(&mut session);
    assert_eq!(ticks, 1500);
    assert_eq!(outcome, TickOutcome::Finished);
    assert_eq!(session.state(), RunState::Finished);
    assert_eq!(session.status().time_left, 0);
    assert_eq!(chimes.labels(), vec!["Timer"]);

    session.toggle().unwrap();
    let status = session.status();
    assert_eq!(status.state, RunState::Idle);
    assert_eq!(status.time_left, 1500);
}

#[test]
fn cycle_without_loop_plays_each_phase_once() {
    let (mut session, chimes) = session_with(false);
    session.switch_mode(Mode::Cycle).unwrap();
    session.start().unwrap();
    assert_eq!(session.phase_label(), "Work");

    let (ticks, outcome) = run_until_event(&mut session);
    assert_eq!(ticks, 1500);
    let TickOutcome::Advance(continuation) = outcome else {
        panic!("expected a phase boundary, got {:?}", outcome);
    };
    assert_eq!(session.tick(), TickOutcome::Counting);
    assert!(session.resume_advance(continuation.token));
    assert_eq!(session.status().phase_index, Some(1));
    assert_eq!(session.status().time_left, 300);

    let (ticks, outcome) = run_until_event(&mut session);
    assert_eq!(ticks, 300);
    assert_eq!(outcome, TickOutcome::Finished);
    assert_eq!(session.state(), RunState::Finished);
    assert_eq!(chimes.labels(), vec!["Work", "Break"]);
}

#[test]
fn looping_cycle_wraps_to_the_first_phase() {
    let (mut session, _) = session_with(true);
    session.switch_mode(Mode::Cycle).unwrap();
    session.start().unwrap();

    let mut visited = vec![session.status().phase_index];
    for _ in 0..3 {
        let (_, outcome) = run_until_event(&mut session);
        let TickOutcome::Advance(continuation) = outcome else {
            panic!("looping cycle should never finish");
        };
        assert!(session.resume_advance(continuation.token));
        visited.push(session.status().phase_index);
    }
    assert_eq!(visited, vec![Some(0), Some(1), Some(0), Some(1)]);
    assert_eq!(session.state(), RunState::Running);
}

#[test]
fn pause_between_phases_invalidates_the_continuation() {
    let (mut session, _) = session_with(true);
    session.switch_mode(Mode::Cycle).unwrap();
    session.start().unwrap();

    let (_, outcome) = run_until_event(&mut session);
    let TickOutcome::Advance(continuation) = outcome else {
        panic!("expected a phase boundary");
    };
    session.pause().unwrap();
    assert!(!session.resume_advance(continuation.token));
    assert_eq!(session.state(), RunState::Paused);
    assert_eq!(session.status().phase_index, Some(1));
    assert_eq!(session.status().time_left, 300);
}

#[test]
fn history_keeps_five_distinct_sessions_newest_first() {
    let (mut session, _) = session_with(true);
    session.start().unwrap();
    session.cancel().unwrap();
    session.start().unwrap();
    session.cancel().unwrap();
    assert_eq!(session.history().len(), 1);

    for minutes in 1..=6 {
        session.select_preset(minutes).unwrap();
        session.start().unwrap();
        session.cancel().unwrap();
    }
    let minutes: Vec<u32> = session.history().iter().map(|e| e.total_minutes).collect();
    assert_eq!(minutes.len(), HISTORY_LIMIT);
    assert_eq!(minutes, vec![6, 5, 4, 3, 2]);

    session.select_preset(3).unwrap();
    session.start().unwrap();
    session.cancel().unwrap();
    let minutes: Vec<u32> = session.history().iter().map(|e| e.total_minutes).collect();
    assert_eq!(minutes, vec![3, 6, 5, 4, 2]);
    assert!(session.history().iter().all(|e| e.label == "Timer"));
}

#[test]
fn replaying_a_cycle_restores_its_phases() {
    let (mut session, _) = session_with(true);
    session.switch_mode(Mode::Cycle).unwrap();
    session.start().unwrap();
    session.cancel().unwrap();

    session.add_phase("Review", 10).unwrap();
    session.switch_mode(Mode::Timer).unwrap();
    session.start().unwrap();
    session.cancel().unwrap();

    assert_eq!(session.history()[1].label, "Work");
    session.replay_history(1).unwrap();
    assert_eq!(session.mode(), Mode::Cycle);
    assert_eq!(session.state(), RunState::Running);
    assert_eq!(session.phases().len(), 2);
    assert_eq!(session.history()[0].total_minutes, 30);
}

#[test]
fn mode_switch_is_refused_while_running() {
    let (mut session, _) = session_with(true);
    session.start().unwrap();
    session.tick();

    let err = session.switch_mode(Mode::Cycle).unwrap_err();
    assert!(matches!(err, SessionError::InvalidTransition { .. }));
    assert_eq!(session.mode(), Mode::Timer);
    assert_eq!(session.status().time_left, 1499);

    session.pause().unwrap();
    session.switch_mode(Mode::Cycle).unwrap();
    assert_eq!(session.state(), RunState::Idle);
    assert_eq!(session.status().phase_name.as_deref(), Some("Work"));
}

#[test]
fn invalid_durations_leave_the_timer_alone() {
    let (mut session, _) = session_with(true);
    assert!(session.edit_duration(0).is_err());
    assert!(session.edit_duration(parse_clock("abc")).is_err());
    assert_eq!(session.status().total_time, 1500);

    session.edit_duration(parse_clock("1:30")).unwrap();
    let status = session.status();
    assert_eq!(status.time_left, 90);
    assert_eq!(status.total_time, 90);
}
