//! Command routing for cadencectl.
//!
//! The socket server only parses and forwards; the session is mutated on the
//! thread that owns it, via [`dispatch`].

pub mod server;

use cadence_ipc::{Command, Response};
use tracing::debug;

use crate::error::Result;
use crate::phase::PhaseEdit;
use crate::session::SessionController;

pub use server::Request;

pub fn dispatch(session: &mut SessionController, command: Command) -> Response {
    match command {
        Command::Start => outcome(session.start()),
        Command::Pause => outcome(session.pause()),
        Command::Toggle => outcome(session.toggle()),
        Command::CancelOrReset => outcome(session.cancel_or_reset()),
        Command::SwitchMode { mode } => outcome(session.switch_mode(mode)),
        Command::EditDuration { seconds } => outcome(session.edit_duration(seconds)),
        Command::SelectPreset { minutes } => outcome(session.select_preset(minutes)),
        Command::AddPhase { name, minutes } => outcome(session.add_phase(&name, minutes)),
        Command::EditPhase {
            index,
            name,
            minutes,
        } => outcome(session.edit_phase(index, PhaseEdit { name, minutes })),
        Command::RemovePhase { index } => outcome(session.remove_phase(index)),
        Command::SetLoop { enabled } => {
            session.set_loop(enabled);
            Response::Ok
        }
        Command::SetSound { enabled } => {
            session.set_sound(enabled);
            Response::Ok
        }
        Command::ReplayHistory { index } => outcome(session.replay_history(index)),
        Command::DeleteHistory { index } => outcome(session.delete_history(index)),
        Command::Status => Response::Status(session.status()),
        Command::ListPhases => Response::Phases(session.phases().as_slice().to_vec()),
        Command::ListHistory => Response::History(
            session.history().iter().map(|entry| entry.item()).collect(),
        ),
    }
}

fn outcome<T>(result: Result<T>) -> Response {
    match result {
        Ok(_) => Response::Ok,
        Err(e) => {
            debug!("Ignored command: {}", e);
            Response::Ignored {
                reason: e.to_string(),
            }
        }
    }
}
