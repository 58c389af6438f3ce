//! Session controller: the single writer over engine, phases and history.
//!
//! Every command returns `Err` only to say "nothing happened"; the state is
//! untouched in that case. Ticks and commands must be delivered from one
//! thread of control, in order.

use cadence_ipc::{Mode, Phase, RunState, SessionStatus};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::engine::{Completion, StartKind, TimerEngine};
use crate::error::{Result, SessionError};
use crate::history::{HistoryEntry, HistoryStore, SessionConfig};
use crate::persistence::{self, Store, StoreKey};
use crate::phase::{PhaseEdit, PhaseList};
use crate::signal::{Cue, Signal};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub timer_secs: u64,
    pub loop_enabled: bool,
    pub sound_enabled: bool,
    pub inter_phase_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timer_secs: 25 * 60,
            loop_enabled: true,
            sound_enabled: true,
            inter_phase_delay: Duration::from_millis(100),
        }
    }
}

/// Handle for the scheduled load of the next phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContinuationToken(u64);

/// Ask the caller to run `resume_advance(token)` after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continuation {
    pub token: ContinuationToken,
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to report (still counting, or not running).
    Counting,
    Finished,
    /// A phase ended; the next one starts when the continuation runs.
    Advance(Continuation),
}

pub struct SessionController {
    engine: TimerEngine,
    phases: PhaseList,
    history: HistoryStore,
    store: Box<dyn Store>,
    signal: Box<dyn Signal>,
    sound_enabled: bool,
    inter_phase_delay: Duration,
    pending: Option<ContinuationToken>,
    next_token: u64,
}

impl SessionController {
    /// Load phases and history from `store` (defaults on any failure) and
    /// start idle in Timer mode.
    pub fn new(store: Box<dyn Store>, signal: Box<dyn Signal>, settings: SessionSettings) -> Self {
        let phases = persistence::load_phases(store.as_ref());
        let history = persistence::load_history(store.as_ref());
        let engine = TimerEngine::new(
            Mode::Timer,
            settings.timer_secs,
            settings.loop_enabled,
            &phases,
        );
        Self {
            engine,
            phases,
            history,
            store,
            signal,
            sound_enabled: settings.sound_enabled,
            inter_phase_delay: settings.inter_phase_delay,
            pending: None,
            next_token: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn state(&self) -> RunState {
        self.engine.state()
    }

    pub fn mode(&self) -> Mode {
        self.engine.mode()
    }

    pub fn phases(&self) -> &PhaseList {
        &self.phases
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.entries()
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn loop_enabled(&self) -> bool {
        self.engine.loop_enabled()
    }

    /// True while the clock should be armed.
    pub fn is_ticking(&self) -> bool {
        self.engine.is_ticking()
    }

    pub fn progress(&self) -> f64 {
        self.engine.progress()
    }

    /// Total minutes and number of phases in the cycle.
    pub fn cycle_summary(&self) -> (u32, usize) {
        (self.phases.total_minutes(), self.phases.len())
    }

    pub fn active_phase(&self) -> Option<&Phase> {
        self.engine.phase_index().and_then(|i| self.phases.get(i))
    }

    /// What the phase indicator shows.
    pub fn phase_label(&self) -> String {
        match (self.engine.state(), self.engine.mode()) {
            (RunState::Running | RunState::Paused, Mode::Cycle) => self
                .active_phase()
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            (RunState::Running | RunState::Paused, Mode::Timer) => "Timer".to_string(),
            _ => "Standby".to_string(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            mode: self.engine.mode(),
            state: self.engine.state(),
            time_left: self.engine.time_left(),
            total_time: self.engine.total_time(),
            phase_index: self.engine.phase_index(),
            phase_name: self.active_phase().map(|p| p.name.clone()),
            loop_enabled: self.engine.loop_enabled(),
            sound_enabled: self.sound_enabled,
        }
    }

    // ── Run-state commands ───────────────────────────────────────────

    pub fn start(&mut self) -> Result<StartKind> {
        let kind = self.engine.start()?;
        match kind {
            StartKind::Fresh => {
                let config = self.current_config();
                let entry = self.history.record(config, Utc::now().timestamp_millis());
                info!(
                    "Started {:?} session '{}' ({} min)",
                    entry.mode, entry.label, entry.total_minutes
                );
                self.persist_history();
            }
            StartKind::Resumed => debug!("Resumed with {}s left", self.engine.time_left()),
        }
        Ok(kind)
    }

    pub fn pause(&mut self) -> Result<()> {
        self.engine.pause(&self.phases)?;
        self.pending = None;
        debug!("Paused with {}s left", self.engine.time_left());
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.engine.cancel(&self.phases)?;
        self.pending = None;
        info!("Session cancelled");
        Ok(())
    }

    pub fn reset(&mut self) -> Result<()> {
        self.engine.reset(&self.phases)?;
        self.pending = None;
        debug!("Session reset");
        Ok(())
    }

    pub fn cancel_or_reset(&mut self) -> Result<()> {
        match self.engine.state() {
            RunState::Finished => self.reset(),
            _ => self.cancel(),
        }
    }

    /// Primary action: start from idle or pause, pause while running,
    /// reset once finished.
    pub fn toggle(&mut self) -> Result<()> {
        match self.engine.state() {
            RunState::Idle | RunState::Paused => self.start().map(|_| ()),
            RunState::Running => self.pause(),
            RunState::Finished => self.reset(),
        }
    }

    pub fn switch_mode(&mut self, mode: Mode) -> Result<()> {
        self.engine.switch_mode(mode, &self.phases)?;
        self.pending = None;
        debug!("Switched to {:?} mode", mode);
        Ok(())
    }

    // ── Configuration commands ───────────────────────────────────────

    pub fn edit_duration(&mut self, seconds: u64) -> Result<()> {
        self.engine.edit_duration(seconds)
    }

    pub fn select_preset(&mut self, minutes: u32) -> Result<()> {
        self.engine.set_timer_secs(u64::from(minutes) * 60)
    }

    pub fn add_phase(&mut self, name: &str, minutes: u32) -> Result<()> {
        self.phases.add(name, minutes)?;
        self.phases_mutated();
        Ok(())
    }

    pub fn edit_phase(&mut self, index: usize, edit: PhaseEdit) -> Result<()> {
        self.phases.edit(index, edit)?;
        self.phases_mutated();
        Ok(())
    }

    pub fn remove_phase(&mut self, index: usize) -> Result<()> {
        self.engine.check_removal(index)?;
        self.phases.remove(index)?;
        self.engine.phase_removed(index, &self.phases);
        self.persist_phases();
        Ok(())
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.engine.set_loop(enabled);
    }

    pub fn set_sound(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    // ── History commands ─────────────────────────────────────────────

    /// Install the configuration stored at `index` and start it.
    pub fn replay_history(&mut self, index: usize) -> Result<StartKind> {
        if self.engine.state() == RunState::Running {
            return Err(SessionError::InvalidTransition {
                action: "replay history",
                state: RunState::Running,
            });
        }
        match self.history.replay(index)? {
            SessionConfig::Timer { duration_secs } => {
                self.engine.set_timer_secs(duration_secs)?;
                self.switch_mode(Mode::Timer)?;
            }
            SessionConfig::Cycle { phases } => {
                self.phases = phases;
                self.persist_phases();
                self.switch_mode(Mode::Cycle)?;
            }
        }
        self.start()
    }

    pub fn delete_history(&mut self, index: usize) -> Result<()> {
        let removed = self.history.remove(index)?;
        debug!("Deleted history entry {}", removed.id);
        self.persist_history();
        Ok(())
    }

    // ── Clock ────────────────────────────────────────────────────────

    /// Deliver one elapsed second.
    pub fn tick(&mut self) -> TickOutcome {
        let Some(completion) = self.engine.tick(&self.phases) else {
            return TickOutcome::Counting;
        };
        match completion {
            Completion::Finished => {
                let label = self.completed_label();
                info!("Session finished after '{}'", label);
                self.chime(label, true);
                TickOutcome::Finished
            }
            Completion::PhaseEnded { ended, next } => {
                let label = self
                    .phases
                    .get(ended)
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                debug!("Phase {} '{}' ended, phase {} is next", ended, label, next);
                self.chime(label, false);
                self.next_token += 1;
                let token = ContinuationToken(self.next_token);
                self.pending = Some(token);
                TickOutcome::Advance(Continuation {
                    token,
                    delay: self.inter_phase_delay,
                })
            }
        }
    }

    /// Run a scheduled phase load. Returns false for a token invalidated by
    /// pause, cancel, reset or a mode switch.
    pub fn resume_advance(&mut self, token: ContinuationToken) -> bool {
        if self.pending != Some(token) {
            debug!("Dropping stale continuation {:?}", token);
            return false;
        }
        self.pending = None;
        match self.engine.load_pending(&self.phases) {
            Some(index) => {
                info!(
                    "Phase {} '{}' started",
                    index,
                    self.phases.get(index).map(|p| p.name.as_str()).unwrap_or("")
                );
            }
            None => info!("Cycle finished"),
        }
        true
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn current_config(&self) -> SessionConfig {
        match self.engine.mode() {
            Mode::Timer => SessionConfig::Timer {
                duration_secs: self.engine.timer_secs(),
            },
            Mode::Cycle => SessionConfig::Cycle {
                phases: self.phases.clone(),
            },
        }
    }

    fn completed_label(&self) -> String {
        match self.engine.mode() {
            Mode::Timer => "Timer".to_string(),
            Mode::Cycle => self
                .active_phase()
                .map(|p| p.name.clone())
                .unwrap_or_default(),
        }
    }

    fn chime(&mut self, label: String, finished: bool) {
        let cue = Cue {
            label,
            finished,
            sound_enabled: self.sound_enabled,
        };
        self.signal.play_end_of_phase(&cue);
    }

    fn phases_mutated(&mut self) {
        self.engine.phases_changed(&self.phases);
        self.persist_phases();
    }

    fn persist_phases(&mut self) {
        if let Err(e) = persistence::save(self.store.as_mut(), StoreKey::Phases, &self.phases) {
            warn!("Failed to save phases, keeping them in memory only: {}", e);
        }
    }

    fn persist_history(&mut self) {
        if let Err(e) = persistence::save(
            self.store.as_mut(),
            StoreKey::History,
            self.history.entries(),
        ) {
            warn!("Failed to save history, keeping it in memory only: {}", e);
        }
    }
}
