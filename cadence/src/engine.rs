//! Countdown state machine.
//!
//! The engine has no thread and no clock of its own. The caller delivers one
//! `tick()` per elapsed second while [`TimerEngine::is_ticking`] is true, and
//! passes the current [`PhaseList`] to every operation that may load a phase.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused | Finished)
//! Paused -> Running | Idle
//! Finished -> Idle
//! ```
//!
//! In Cycle mode a finished phase leaves the engine `Running` but between
//! phases until [`TimerEngine::load_pending`] installs the next one.

use cadence_ipc::{Mode, RunState};

use crate::error::{Result, SessionError};
use crate::phase::PhaseList;

/// How `start()` got the countdown moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartKind {
    /// A new session from idle; the caller records it in history.
    Fresh,
    /// Continued from pause with the remaining time untouched.
    Resumed,
}

/// What happened when the countdown reached zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Timer mode, or the last phase of a non-looping cycle.
    Finished,
    /// A cycle phase ended and `next` is waiting to be loaded.
    PhaseEnded { ended: usize, next: usize },
}

#[derive(Debug, Clone)]
pub struct TimerEngine {
    mode: Mode,
    state: RunState,
    /// Remaining seconds of the current countdown.
    time_left: u64,
    /// Full length of the current countdown in seconds.
    total_time: u64,
    phase_index: usize,
    /// Configured single-timer duration, reloaded on cancel in Timer mode.
    timer_secs: u64,
    loop_enabled: bool,
    pending_phase: Option<usize>,
}

impl TimerEngine {
    /// Create an idle engine with the mode's initial duration loaded.
    ///
    /// A zero `timer_secs` is raised to one minute.
    pub fn new(mode: Mode, timer_secs: u64, loop_enabled: bool, phases: &PhaseList) -> Self {
        let mut engine = Self {
            mode,
            state: RunState::Idle,
            time_left: 0,
            total_time: 0,
            phase_index: 0,
            timer_secs: if timer_secs == 0 { 60 } else { timer_secs },
            loop_enabled,
            pending_phase: None,
        };
        engine.reload(phases);
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    pub fn total_time(&self) -> u64 {
        self.total_time
    }

    /// Index of the active phase; `None` in Timer mode.
    pub fn phase_index(&self) -> Option<usize> {
        match self.mode {
            Mode::Cycle => Some(self.phase_index),
            Mode::Timer => None,
        }
    }

    pub fn timer_secs(&self) -> u64 {
        self.timer_secs
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    /// True while the clock should deliver ticks.
    pub fn is_ticking(&self) -> bool {
        self.state == RunState::Running && self.pending_phase.is_none()
    }

    pub fn is_between_phases(&self) -> bool {
        self.pending_phase.is_some()
    }

    /// 0.0 .. 1.0 progress within the current countdown.
    pub fn progress(&self) -> f64 {
        if self.total_time == 0 {
            return 0.0;
        }
        1.0 - (self.time_left as f64 / self.total_time as f64)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Result<StartKind> {
        match self.state {
            RunState::Idle => {
                self.state = RunState::Running;
                Ok(StartKind::Fresh)
            }
            RunState::Paused => {
                self.state = RunState::Running;
                Ok(StartKind::Resumed)
            }
            RunState::Running | RunState::Finished => Err(self.refuse("start")),
        }
    }

    /// Pausing between phases installs the next phase first, so the
    /// session pauses at the start of it.
    pub fn pause(&mut self, phases: &PhaseList) -> Result<()> {
        if self.state != RunState::Running {
            return Err(self.refuse("pause"));
        }
        if self.pending_phase.is_some() {
            self.load_pending(phases);
            if self.state != RunState::Running {
                return Ok(());
            }
        }
        self.state = RunState::Paused;
        Ok(())
    }

    pub fn cancel(&mut self, phases: &PhaseList) -> Result<()> {
        match self.state {
            RunState::Running | RunState::Paused => {
                self.stop(phases);
                Ok(())
            }
            RunState::Idle | RunState::Finished => Err(self.refuse("cancel")),
        }
    }

    /// Same as `cancel`, but also clears a finished session.
    pub fn reset(&mut self, phases: &PhaseList) -> Result<()> {
        match self.state {
            RunState::Running | RunState::Paused | RunState::Finished => {
                self.stop(phases);
                Ok(())
            }
            RunState::Idle => Err(self.refuse("reset")),
        }
    }

    pub fn switch_mode(&mut self, mode: Mode, phases: &PhaseList) -> Result<()> {
        if self.state == RunState::Running {
            return Err(self.refuse("switch mode"));
        }
        self.mode = mode;
        self.stop(phases);
        Ok(())
    }

    /// Overwrite the idle countdown. In Timer mode the configured duration
    /// follows, so a later cancel reloads the edited value.
    pub fn edit_duration(&mut self, seconds: u64) -> Result<()> {
        if self.state != RunState::Idle {
            return Err(self.refuse("edit the duration"));
        }
        if seconds == 0 {
            return Err(SessionError::InvalidConfiguration(
                "duration must be positive".into(),
            ));
        }
        self.total_time = seconds;
        self.time_left = seconds;
        if self.mode == Mode::Timer {
            self.timer_secs = seconds;
        }
        Ok(())
    }

    /// Change the configured single-timer duration without touching a
    /// live countdown.
    pub fn set_timer_secs(&mut self, seconds: u64) -> Result<()> {
        if self.state == RunState::Running {
            return Err(self.refuse("change the timer duration"));
        }
        if seconds == 0 {
            return Err(SessionError::InvalidConfiguration(
                "duration must be positive".into(),
            ));
        }
        self.timer_secs = seconds;
        if self.state == RunState::Idle && self.mode == Mode::Timer {
            self.load_duration(seconds);
        }
        Ok(())
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `Some` exactly once per countdown, on the tick that reaches zero.
    pub fn tick(&mut self, phases: &PhaseList) -> Option<Completion> {
        if !self.is_ticking() {
            return None;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left > 0 {
            return None;
        }
        if self.mode == Mode::Timer {
            self.state = RunState::Finished;
            return Some(Completion::Finished);
        }

        let ended = self.phase_index;
        let next = ended + 1;
        if next < phases.len() {
            self.pending_phase = Some(next);
        } else if self.loop_enabled {
            self.pending_phase = Some(0);
        } else {
            self.state = RunState::Finished;
            return Some(Completion::Finished);
        }
        self.pending_phase.map(|next| Completion::PhaseEnded { ended, next })
    }

    /// Install the phase waiting after a completed one and keep running.
    ///
    /// Returns the loaded index, or `None` when nothing was pending or the
    /// list shrank so that the cycle ends here instead.
    pub fn load_pending(&mut self, phases: &PhaseList) -> Option<usize> {
        let next = self.pending_phase.take()?;
        let index = if next < phases.len() {
            next
        } else if self.loop_enabled {
            0
        } else {
            self.state = RunState::Finished;
            return None;
        };
        self.load_phase(index, phases);
        Some(index)
    }

    /// Keep the idle countdown in sync with an edited phase list.
    pub fn phases_changed(&mut self, phases: &PhaseList) {
        if self.mode == Mode::Cycle && self.state == RunState::Idle {
            self.phase_index = 0;
            self.load_phase(0, phases);
        }
    }

    /// Refuse removal of the phase whose countdown is live.
    pub fn check_removal(&self, index: usize) -> Result<()> {
        let active = matches!(self.state, RunState::Running | RunState::Paused);
        if self.mode == Mode::Cycle && active && index == self.phase_index {
            return Err(self.refuse("remove the active phase"));
        }
        Ok(())
    }

    /// Re-point indices after `index` was removed from `phases`.
    pub fn phase_removed(&mut self, index: usize, phases: &PhaseList) {
        if index < self.phase_index {
            self.phase_index -= 1;
        }
        if let Some(pending) = self.pending_phase.as_mut() {
            if index < *pending {
                *pending -= 1;
            }
        }
        if self.phase_index >= phases.len() {
            self.phase_index = phases.len() - 1;
        }
        self.phases_changed(phases);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn refuse(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            state: self.state,
        }
    }

    fn stop(&mut self, phases: &PhaseList) {
        self.pending_phase = None;
        self.state = RunState::Idle;
        self.reload(phases);
    }

    fn reload(&mut self, phases: &PhaseList) {
        match self.mode {
            Mode::Timer => self.load_duration(self.timer_secs),
            Mode::Cycle => {
                self.phase_index = 0;
                self.load_phase(0, phases);
            }
        }
    }

    fn load_phase(&mut self, index: usize, phases: &PhaseList) {
        let phase = phases.get(index).unwrap_or_else(|| phases.first());
        self.phase_index = index.min(phases.len() - 1);
        self.load_duration(phase.duration_secs());
    }

    fn load_duration(&mut self, seconds: u64) {
        self.total_time = seconds;
        self.time_left = seconds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_ipc::Phase;

    fn ab() -> PhaseList {
        PhaseList::new(vec![Phase::new("A", 1), Phase::new("B", 1)]).unwrap()
    }

    fn run_out(engine: &mut TimerEngine, phases: &PhaseList) -> Option<Completion> {
        let mut last = None;
        while engine.is_ticking() {
            last = engine.tick(phases);
        }
        last
    }

    #[test]
    fn start_pause_resume_keeps_time_left() {
        let phases = PhaseList::default();
        let mut engine = TimerEngine::new(Mode::Timer, 25 * 60, false, &phases);
        assert_eq!(engine.start(), Ok(StartKind::Fresh));
        for _ in 0..42 {
            engine.tick(&phases);
        }
        engine.pause(&phases).unwrap();
        let at_pause = engine.time_left();
        assert_eq!(engine.tick(&phases), None);
        assert_eq!(engine.start(), Ok(StartKind::Resumed));
        assert_eq!(engine.time_left(), at_pause);
        assert_eq!(at_pause, 1500 - 42);
    }

    #[test]
    fn start_is_refused_while_running_or_finished() {
        let phases = PhaseList::default();
        let mut engine = TimerEngine::new(Mode::Timer, 60, false, &phases);
        engine.start().unwrap();
        assert!(matches!(
            engine.start(),
            Err(SessionError::InvalidTransition { action: "start", .. })
        ));
        assert_eq!(run_out(&mut engine, &phases), Some(Completion::Finished));
        assert_eq!(engine.state(), RunState::Finished);
        assert!(engine.start().is_err());
    }

    #[test]
    fn timer_mode_finishes_then_resets() {
        let phases = PhaseList::default();
        let mut engine = TimerEngine::new(Mode::Timer, 1500, false, &phases);
        engine.start().unwrap();
        assert_eq!((engine.total_time(), engine.time_left()), (1500, 1500));
        for _ in 0..1499 {
            assert_eq!(engine.tick(&phases), None);
        }
        assert_eq!(engine.tick(&phases), Some(Completion::Finished));
        assert_eq!(engine.time_left(), 0);
        assert!(!engine.is_ticking());

        assert!(engine.cancel(&phases).is_err());
        engine.reset(&phases).unwrap();
        assert_eq!(engine.state(), RunState::Idle);
        assert_eq!(engine.time_left(), 1500);
    }

    #[test]
    fn cycle_loops_through_phases() {
        let phases = ab();
        let mut engine = TimerEngine::new(Mode::Cycle, 60, true, &phases);
        engine.start().unwrap();
        let mut visited = vec![engine.phase_index().unwrap()];
        for _ in 0..3 {
            let completion = run_out(&mut engine, &phases);
            assert!(matches!(completion, Some(Completion::PhaseEnded { .. })));
            assert_eq!(engine.state(), RunState::Running);
            visited.push(engine.load_pending(&phases).unwrap());
        }
        assert_eq!(visited, vec![0, 1, 0, 1]);
    }

    #[test]
    fn cycle_without_loop_finishes_after_last_phase() {
        let phases = ab();
        let mut engine = TimerEngine::new(Mode::Cycle, 60, false, &phases);
        engine.start().unwrap();
        assert_eq!(
            run_out(&mut engine, &phases),
            Some(Completion::PhaseEnded { ended: 0, next: 1 })
        );
        engine.load_pending(&phases);
        assert_eq!(run_out(&mut engine, &phases), Some(Completion::Finished));
        assert_eq!(engine.state(), RunState::Finished);
        assert_eq!(engine.load_pending(&phases), None);
        assert_eq!(engine.phase_index(), Some(1));
    }

    #[test]
    fn start_between_phases_is_refused() {
        let phases = ab();
        let mut engine = TimerEngine::new(Mode::Cycle, 60, true, &phases);
        engine.start().unwrap();
        run_out(&mut engine, &phases);
        assert!(engine.is_between_phases());
        assert!(engine.start().is_err());
        assert!(engine.switch_mode(Mode::Timer, &phases).is_err());
    }

    #[test]
    fn cancel_between_phases_drops_the_pending_phase() {
        let phases = ab();
        let mut engine = TimerEngine::new(Mode::Cycle, 60, true, &phases);
        engine.start().unwrap();
        run_out(&mut engine, &phases);
        engine.cancel(&phases).unwrap();
        assert_eq!(engine.load_pending(&phases), None);
        assert_eq!(engine.state(), RunState::Idle);
        assert_eq!(engine.phase_index(), Some(0));
    }

    #[test]
    fn pause_between_phases_pauses_at_next_phase() {
        let phases = PhaseList::new(vec![Phase::new("A", 1), Phase::new("B", 3)]).unwrap();
        let mut engine = TimerEngine::new(Mode::Cycle, 60, true, &phases);
        engine.start().unwrap();
        run_out(&mut engine, &phases);
        engine.pause(&phases).unwrap();
        assert_eq!(engine.state(), RunState::Paused);
        assert_eq!(engine.phase_index(), Some(1));
        assert_eq!(engine.time_left(), 180);
    }

    #[test]
    fn switch_mode_refused_while_running() {
        let phases = PhaseList::default();
        let mut engine = TimerEngine::new(Mode::Timer, 600, true, &phases);
        engine.start().unwrap();
        engine.tick(&phases);
        assert!(engine.switch_mode(Mode::Cycle, &phases).is_err());
        assert_eq!(engine.mode(), Mode::Timer);
        assert_eq!(engine.state(), RunState::Running);
        assert_eq!(engine.time_left(), 599);
    }

    #[test]
    fn switch_mode_from_paused_installs_first_phase() {
        let phases = PhaseList::default();
        let mut engine = TimerEngine::new(Mode::Timer, 600, true, &phases);
        engine.start().unwrap();
        engine.pause(&phases).unwrap();
        engine.switch_mode(Mode::Cycle, &phases).unwrap();
        assert_eq!(engine.state(), RunState::Idle);
        assert_eq!(engine.total_time(), 1500);
        assert_eq!(engine.phase_index(), Some(0));
    }

    #[test]
    fn edit_duration_updates_timer_configuration() {
        let phases = PhaseList::default();
        let mut engine = TimerEngine::new(Mode::Timer, 1500, true, &phases);
        assert!(engine.edit_duration(0).is_err());
        assert_eq!(engine.total_time(), 1500);

        engine.edit_duration(90).unwrap();
        engine.start().unwrap();
        engine.tick(&phases);
        engine.cancel(&phases).unwrap();
        assert_eq!(engine.time_left(), 90);
        assert_eq!(engine.timer_secs(), 90);
    }

    #[test]
    fn edit_duration_in_cycle_mode_leaves_phases_alone() {
        let phases = PhaseList::default();
        let mut engine = TimerEngine::new(Mode::Cycle, 1500, true, &phases);
        engine.edit_duration(120).unwrap();
        assert_eq!(engine.time_left(), 120);
        assert_eq!(engine.timer_secs(), 1500);
    }

    #[test]
    fn removing_earlier_phase_keeps_active_phase() {
        let mut phases = PhaseList::new(vec![
            Phase::new("A", 1),
            Phase::new("B", 2),
            Phase::new("C", 3),
        ])
        .unwrap();
        let mut engine = TimerEngine::new(Mode::Cycle, 60, false, &phases);
        engine.start().unwrap();
        run_out(&mut engine, &phases);
        engine.load_pending(&phases);
        assert_eq!(engine.phase_index(), Some(1));

        assert!(engine.check_removal(1).is_err());
        engine.check_removal(0).unwrap();
        phases.remove(0).unwrap();
        engine.phase_removed(0, &phases);
        assert_eq!(engine.phase_index(), Some(0));
        assert_eq!(engine.time_left(), 120);
    }

    #[test]
    fn removing_phase_while_idle_reloads_first() {
        let mut phases = ab();
        let mut engine = TimerEngine::new(Mode::Cycle, 60, false, &phases);
        phases.remove(0).unwrap();
        engine.phase_removed(0, &phases);
        assert_eq!(engine.phase_index(), Some(0));
        assert_eq!(engine.total_time(), 60);
    }
}
