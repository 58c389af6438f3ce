//! # Cadence
//!
//! Countdown timer engine with two modes: a single fixed-duration timer, and
//! a cycle of named phases that can loop forever.
//!
//! ## Architecture
//!
//! - [`TimerEngine`]: tick-driven countdown state machine and phase advancement
//! - [`PhaseList`]: the ordered, never-empty cycle definition
//! - [`HistoryStore`]: five most recent session configurations, deduplicated
//! - [`SessionController`]: owns all of the above plus persistence and the
//!   end-of-phase signal; the only writer
//!
//! The controller never spawns anything. The event loop delivers ticks from a
//! [`Ticker`] and runs the [`Continuation`] handed back at each phase boundary.

pub mod clock;
pub mod config;
pub mod duration;
pub mod engine;
pub mod error;
pub mod history;
pub mod ipc;
pub mod persistence;
pub mod phase;
pub mod session;
pub mod signal;

pub use cadence_ipc::{Mode, Phase, RunState, SessionStatus};
pub use clock::Ticker;
pub use config::Config;
pub use engine::{Completion, StartKind, TimerEngine};
pub use error::{SessionError, StorageError};
pub use history::{HistoryEntry, HistoryStore, SessionConfig, HISTORY_LIMIT};
pub use persistence::{FileStore, MemoryStore, Store, StoreKey};
pub use phase::{PhaseEdit, PhaseList};
pub use session::{Continuation, ContinuationToken, SessionController, SessionSettings, TickOutcome};
pub use signal::{Cue, DesktopSignal, Signal};
