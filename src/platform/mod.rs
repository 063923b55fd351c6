//! Platform abstraction layer
//!
//! Capabilities the core calls out to, kept as small traits so the
//! experiment can run under a terminal, a GUI shell, or a test harness:
//! - Monotonic time
//! - Participant identity prompt

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic millisecond clock
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Hand-advanced clock. Clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Asks the operator for the next participant's identifier.
///
/// `None` means the prompt was cancelled. Blank answers are the core's
/// concern, not the prompt's.
pub trait ParticipantPrompt {
    fn request_participant_id(&mut self) -> Option<String>;
}

/// Replays a fixed list of answers, then behaves as cancelled
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    answers: Vec<Option<String>>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let mut answers: Vec<_> = answers.into_iter().map(|a| a.map(Into::into)).collect();
        answers.reverse();
        Self { answers }
    }
}

impl ParticipantPrompt for ScriptedPrompt {
    fn request_participant_id(&mut self) -> Option<String> {
        self.answers.pop().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_shared() {
        let clock = ManualClock::new(100);
        let view = clock.clone();
        clock.advance(250);
        assert_eq!(view.now_ms(), 350);
        view.set(10);
        assert_eq!(clock.now_ms(), 10);
    }

    #[test]
    fn test_monotonic_clock_never_goes_back() {
        let clock = MonotonicClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }

    #[test]
    fn test_scripted_prompt_order() {
        let mut prompt = ScriptedPrompt::new([Some("P01"), None, Some("P03")]);
        assert_eq!(prompt.request_participant_id().as_deref(), Some("P01"));
        assert_eq!(prompt.request_participant_id(), None);
        assert_eq!(prompt.request_participant_id().as_deref(), Some("P03"));
        assert_eq!(prompt.request_participant_id(), None);
    }
}
