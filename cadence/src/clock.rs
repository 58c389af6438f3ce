//! One-second tick source.
//!
//! The ticker is driven by the event loop: `sync` arms or disarms it to
//! follow the session, `poll` reports at most one due tick per call.

use std::time::{Duration, Instant};

pub const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Default, Clone)]
pub struct Ticker {
    next: Option<Instant>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.next.is_some()
    }

    /// Arm on a false -> true edge (first tick one second from `now`),
    /// disarm when `armed` is false.
    pub fn sync(&mut self, armed: bool, now: Instant) {
        match (armed, self.next) {
            (true, None) => self.next = Some(now + TICK),
            (false, Some(_)) => self.next = None,
            _ => {}
        }
    }

    /// True if a tick is due. Each call delivers at most one tick.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next {
            Some(due) if due <= now => {
                self.next = Some(due + TICK);
                true
            }
            _ => false,
        }
    }

    /// Time until the next tick, if armed.
    pub fn until_next(&self, now: Instant) -> Option<Duration> {
        self.next.map(|due| due.saturating_duration_since(now))
    }
}
