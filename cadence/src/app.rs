use cadence::duration::{format_clock, parse_clock, parse_minutes};
use cadence::ipc::{self, Request};
use cadence::session::{ContinuationToken, TickOutcome};
use cadence::{Config, Mode, PhaseEdit, SessionController, SessionError, Ticker};
use std::time::{Duration, Instant};
use tracing::debug;

/// Minutes given to a phase added from the prompt.
const NEW_PHASE_MINUTES: u32 = 5;
/// Upper bound on how long the loop waits for input.
const FRAME: Duration = Duration::from_millis(100);

#[derive(Default, Clone, PartialEq, Debug)]
pub enum InputMode {
    #[default]
    Normal,
    EditingDuration,
    AddingPhase,
    RenamingPhase(usize),
    RetimingPhase(usize),
    DeletingHistory,
    ShowHelp,
}

pub struct App {
    pub session: SessionController,
    pub config: Config,
    pub mode: InputMode,
    pub input_buffer: String,
    pub selected_phase: usize,
    pub preset_index: usize,
    /// Why the last command did nothing, shown in the status bar.
    pub notice: Option<String>,
    pub should_quit: bool,
    ticker: Ticker,
    pending: Option<(ContinuationToken, Instant)>,
}

impl App {
    pub fn new(session: SessionController, config: Config) -> Self {
        Self {
            session,
            config,
            mode: InputMode::Normal,
            input_buffer: String::new(),
            selected_phase: 0,
            preset_index: 0,
            notice: None,
            should_quit: false,
            ticker: Ticker::new(),
            pending: None,
        }
    }

    // ── Clock ────────────────────────────────────────────────────────

    /// Deliver due ticks and run a due phase continuation.
    pub fn advance_clock(&mut self, now: Instant) {
        if let Some((token, due)) = self.pending {
            if due <= now {
                self.pending = None;
                self.session.resume_advance(token);
            }
        }
        self.ticker.sync(self.session.is_ticking(), now);
        while self.ticker.poll(now) {
            if let TickOutcome::Advance(continuation) = self.session.tick() {
                self.pending = Some((continuation.token, now + continuation.delay));
            }
            self.ticker.sync(self.session.is_ticking(), now);
        }
    }

    /// How long the event loop may block before something is due.
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        let mut timeout = FRAME;
        if let Some(until_tick) = self.ticker.until_next(now) {
            timeout = timeout.min(until_tick);
        }
        if let Some((_, due)) = self.pending {
            timeout = timeout.min(due.saturating_duration_since(now));
        }
        timeout
    }

    pub fn handle_request(&mut self, request: Request) {
        debug!("IPC command {:?}", request.command);
        let response = ipc::dispatch(&mut self.session, request.command.clone());
        self.clamp_selection();
        request.respond(response);
    }

    // ── Normal-mode actions ──────────────────────────────────────────

    pub fn toggle(&mut self) {
        let result = self.session.toggle();
        self.report(result);
    }

    pub fn cancel_or_reset(&mut self) {
        let result = self.session.cancel_or_reset();
        self.report(result);
    }

    pub fn switch_mode(&mut self) {
        let next = match self.session.mode() {
            Mode::Timer => Mode::Cycle,
            Mode::Cycle => Mode::Timer,
        };
        let result = self.session.switch_mode(next);
        self.report(result);
    }

    /// Digits 1-5 replay the matching history slot.
    pub fn replay_slot(&mut self, slot: usize) {
        if slot == 0 || slot > self.session.history().len() {
            return;
        }
        let result = self.session.replay_history(slot - 1);
        self.report(result);
        self.clamp_selection();
    }

    pub fn next_preset(&mut self) {
        let presets = self.config.presets();
        if presets.is_empty() {
            return;
        }
        self.preset_index = (self.preset_index + 1) % presets.len();
        let result = self.session.select_preset(presets[self.preset_index]);
        self.report(result);
    }

    pub fn toggle_loop(&mut self) {
        let enabled = !self.session.loop_enabled();
        self.session.set_loop(enabled);
    }

    pub fn toggle_sound(&mut self) {
        let enabled = !self.session.sound_enabled();
        self.session.set_sound(enabled);
    }

    pub fn delete_selected_phase(&mut self) {
        let result = self.session.remove_phase(self.selected_phase);
        self.report(result);
        self.clamp_selection();
    }

    pub fn move_selection_up(&mut self) {
        self.selected_phase = self.selected_phase.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        self.selected_phase = (self.selected_phase + 1).min(self.session.phases().len() - 1);
    }

    // ── Prompts ──────────────────────────────────────────────────────

    pub fn begin_input(&mut self, mode: InputMode) {
        self.input_buffer = match &mode {
            InputMode::EditingDuration => format_clock(self.session.engine().time_left()),
            InputMode::RenamingPhase(i) => self
                .session
                .phases()
                .get(*i)
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            InputMode::RetimingPhase(i) => self
                .session
                .phases()
                .get(*i)
                .map(|p| p.minutes.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        };
        self.mode = mode;
    }

    pub fn handle_char(&mut self, c: char) {
        match self.mode {
            InputMode::DeletingHistory => {
                if let Some(slot) = c.to_digit(10) {
                    let slot = slot as usize;
                    if slot > 0 {
                        let result = self.session.delete_history(slot - 1);
                        self.report(result);
                    }
                }
                self.mode = InputMode::Normal;
            }
            InputMode::Normal | InputMode::ShowHelp => {}
            _ if c == '\n' => self.submit_input(),
            InputMode::EditingDuration => {
                if c.is_ascii_digit() || c == ':' {
                    self.input_buffer.push(c);
                }
            }
            _ => self.input_buffer.push(c),
        }
    }

    pub fn handle_backspace(&mut self) {
        self.input_buffer.pop();
    }

    pub fn cancel_input(&mut self) {
        self.input_buffer.clear();
        self.mode = InputMode::Normal;
    }

    fn submit_input(&mut self) {
        let input = std::mem::take(&mut self.input_buffer);
        let result = match self.mode {
            InputMode::EditingDuration => self.session.edit_duration(parse_clock(&input)),
            InputMode::AddingPhase => self.session.add_phase(&input, NEW_PHASE_MINUTES),
            InputMode::RenamingPhase(index) => self.session.edit_phase(
                index,
                PhaseEdit {
                    name: Some(input),
                    minutes: None,
                },
            ),
            InputMode::RetimingPhase(index) => self.session.edit_phase(
                index,
                PhaseEdit {
                    name: None,
                    minutes: Some(parse_minutes(&input)),
                },
            ),
            _ => Ok(()),
        };
        self.report(result);
        self.mode = InputMode::Normal;
    }

    fn report<T>(&mut self, result: Result<T, SessionError>) {
        self.notice = result.err().map(|e| {
            debug!("Ignored: {}", e);
            e.to_string()
        });
    }

    fn clamp_selection(&mut self) {
        let last = self.session.phases().len() - 1;
        self.selected_phase = self.selected_phase.min(last);
    }
}
