//! End-of-phase signal.
//!
//! The session fires the signal unconditionally on every completed phase or
//! session; the implementation decides whether anything is audible.

use std::io::Write;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// Name of the phase that just ended, or "Timer".
    pub label: String,
    /// True when nothing follows (timer done or cycle finished).
    pub finished: bool,
    pub sound_enabled: bool,
}

pub trait Signal: Send {
    fn play_end_of_phase(&mut self, cue: &Cue);
}

/// Terminal bell plus a desktop notification.
#[derive(Debug, Default)]
pub struct DesktopSignal;

impl Signal for DesktopSignal {
    fn play_end_of_phase(&mut self, cue: &Cue) {
        if !cue.sound_enabled {
            debug!("Sound off, skipping chime for {}", cue.label);
            return;
        }
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(b"\x07").and_then(|_| stdout.flush());

        let body = if cue.finished {
            format!("{} complete - session finished", cue.label)
        } else {
            format!("{} complete", cue.label)
        };
        if let Err(e) = notify_rust::Notification::new()
            .summary("Cadence")
            .body(&body)
            .appname("cadence")
            .show()
        {
            error!("Failed to send notification: {}", e);
        }
    }
}
