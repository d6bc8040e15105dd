//! Finite State Machine for the designated key's press/release cycle

use crate::hal::{Duration, Instant};
use crate::timing::TimingClassifier;
use crate::types::{DecoderConfig, KeyAction, KeyCode, KeyEvent, PressClass, PressState};

/// What a single key event did to the FSM
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PressOutcome {
    /// Wrong key, or an edge not expected in the current state
    Ignored,
    /// Designated key went down while Idle
    Started,
    /// Hold shorter than the debounce time, dropped silently
    Debounced,
    /// Hold was measured and classified
    Classified {
        class: PressClass,
        duration_ms: u64,
        released_at: Instant,
    },
}

/// Key press FSM: Idle -> Pressing -> Processing -> Idle
pub struct KeyPressFsm {
    key: KeyCode,
    state: PressState,
    press_start: Option<Instant>,
    release_time: Option<Instant>,
    settle_deadline: Option<Instant>,
    last_duration_ms: Option<u64>,
    debounce: Duration,
    settle: Duration,
}

impl KeyPressFsm {
    /// Create new FSM for the given key
    pub fn new(key: KeyCode, debounce: Duration, settle: Duration) -> Self {
        Self {
            key,
            state: PressState::Idle,
            press_start: None,
            release_time: None,
            settle_deadline: None,
            last_duration_ms: None,
            debounce,
            settle,
        }
    }

    pub fn from_config(config: &DecoderConfig) -> Self {
        Self::new(config.key, config.debounce, config.settle)
    }

    /// Get current FSM state
    pub fn current_state(&self) -> PressState {
        self.state
    }

    pub fn key(&self) -> KeyCode {
        self.key
    }

    /// Rebind the designated key; an in-flight press is abandoned
    pub fn set_key(&mut self, key: KeyCode) {
        if key != self.key {
            self.key = key;
            self.reset();
        }
    }

    pub fn press_start(&self) -> Option<Instant> {
        self.press_start
    }

    pub fn release_time(&self) -> Option<Instant> {
        self.release_time
    }

    /// Duration of the last measured press, debounced ones included
    pub fn last_press_duration(&self) -> Option<u64> {
        self.last_duration_ms
    }

    /// When Processing will settle back to Idle
    pub fn next_deadline(&self) -> Option<Instant> {
        self.settle_deadline
    }

    /// Feed one key edge
    pub fn handle(&mut self, event: &KeyEvent, timing: &TimingClassifier) -> PressOutcome {
        if event.key != self.key {
            return PressOutcome::Ignored;
        }

        // Settling is purely time driven; apply it before judging the edge
        self.poll(event.at);

        match (self.state, event.action) {
            (PressState::Idle, KeyAction::Press) => {
                self.press_start = Some(event.at);
                self.state = PressState::Pressing;

                #[cfg(feature = "defmt")]
                defmt::trace!("press start at {}", event.at.as_millis());

                PressOutcome::Started
            }
            (PressState::Pressing, KeyAction::Release) => self.handle_release(event.at, timing),
            _ => PressOutcome::Ignored,
        }
    }

    fn handle_release(&mut self, at: Instant, timing: &TimingClassifier) -> PressOutcome {
        // Pressing always carries a start time
        let Some(start) = self.press_start else {
            self.to_idle();
            return PressOutcome::Ignored;
        };
        self.release_time = Some(at);

        let duration = at.saturating_duration_since(start);
        let duration_ms = duration.as_millis();
        self.last_duration_ms = Some(duration_ms);

        if duration < self.debounce {
            #[cfg(feature = "defmt")]
            defmt::trace!("bounce {}ms discarded", duration_ms);

            self.to_idle();
            return PressOutcome::Debounced;
        }

        let class = timing.classify_press(duration_ms);
        self.state = PressState::Processing;
        self.settle_deadline = Some(at + self.settle);

        #[cfg(feature = "defmt")]
        defmt::debug!("press {}ms -> {}", duration_ms, class);

        PressOutcome::Classified { class, duration_ms, released_at: at }
    }

    /// Settle Processing back to Idle once the settle time has passed
    pub fn poll(&mut self, now: Instant) {
        if self.state == PressState::Processing {
            if let Some(deadline) = self.settle_deadline {
                if now >= deadline {
                    self.to_idle();
                }
            }
        }
    }

    fn to_idle(&mut self) {
        self.state = PressState::Idle;
        self.press_start = None;
        self.release_time = None;
        self.settle_deadline = None;
    }

    /// Reset FSM to initial state
    pub fn reset(&mut self) {
        self.to_idle();
        self.last_duration_ms = None;
    }
}
