//! Pause scheduler: one idle period yields one letter boundary, then one word boundary

use crate::hal::Instant;
use crate::timing::TimingProfile;
use crate::types::Boundary;

/// Cancellable deadlines for the current idle period.
///
/// Both deadlines are measured from the same action timestamp. The word
/// deadline is only considered once the letter deadline has fired, so a single
/// idle period can never yield a word boundary ahead of its letter boundary.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PauseScheduler {
    anchor: Option<Instant>,
    letter_at: Option<Instant>,
    word_at: Option<Instant>,
    suspended: bool,
}

impl PauseScheduler {
    pub const fn new() -> Self {
        Self {
            anchor: None,
            letter_at: None,
            word_at: None,
            suspended: false,
        }
    }

    /// Start a new idle period at `action`, replacing any outstanding one
    pub fn arm(&mut self, action: Instant, profile: &TimingProfile) {
        self.anchor = Some(action);
        self.letter_at = Some(action + profile.letter_gap());
        self.word_at = Some(action + profile.word_gap());
        self.suspended = false;

        #[cfg(feature = "defmt")]
        defmt::trace!("idle period armed at {}", action.as_millis());
    }

    /// Drop both deadlines
    pub fn cancel(&mut self) {
        self.anchor = None;
        self.letter_at = None;
        self.word_at = None;
        self.suspended = false;
    }

    /// Hold the deadlines while the key is down
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Continue the held idle period, still measured from its original action
    pub fn resume(&mut self) {
        self.suspended = false;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Timestamp of the action that started the current idle period
    pub fn anchor(&self) -> Option<Instant> {
        self.anchor
    }

    /// Earliest pending deadline, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.suspended {
            return None;
        }
        self.letter_at.or(self.word_at)
    }

    /// Pending boundary kind, if any
    pub fn pending(&self) -> Option<Boundary> {
        match (self.letter_at, self.word_at) {
            (Some(_), _) => Some(Boundary::Letter),
            (None, Some(_)) => Some(Boundary::Word),
            (None, None) => None,
        }
    }

    /// Fire at most one due boundary. Call repeatedly until `None` to catch up
    /// after a long sleep; the letter always comes first.
    pub fn poll(&mut self, now: Instant) -> Option<Boundary> {
        if self.suspended {
            return None;
        }

        if let Some(at) = self.letter_at {
            if now >= at {
                self.letter_at = None;
                #[cfg(feature = "defmt")]
                defmt::debug!("letter boundary at {}", now.as_millis());
                return Some(Boundary::Letter);
            }
            return None;
        }

        if let Some(at) = self.word_at {
            if now >= at {
                self.word_at = None;
                self.anchor = None;
                #[cfg(feature = "defmt")]
                defmt::debug!("word boundary at {}", now.as_millis());
                return Some(Boundary::Word);
            }
        }
        None
    }
}
