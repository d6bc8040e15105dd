//! Test utilities for decoder core functionality

pub mod keying_simulator {
    //! Keying script simulation for testing

    use crate::hal::Instant;
    use crate::timing::TimingProfile;
    use crate::types::{KeyCode, KeyEvent};

    /// Builder for a timed sequence of key edges on one key
    #[derive(Debug, Clone)]
    pub struct KeyingScript {
        key: KeyCode,
        now: u64,
        events: Vec<KeyEvent>,
    }

    impl KeyingScript {
        pub fn new(key: KeyCode) -> Self {
            Self { key, now: 0, events: Vec::new() }
        }

        /// Start the script at `ms`
        pub fn starting_at(mut self, ms: u64) -> Self {
            self.now = ms;
            self
        }

        /// Hold the key for `ms`
        pub fn hold(mut self, ms: u64) -> Self {
            self.events.push(KeyEvent::press(self.key, Instant::from_millis(self.now)));
            self.now += ms;
            self.events.push(KeyEvent::release(self.key, Instant::from_millis(self.now)));
            self
        }

        /// Stay silent for `ms`
        pub fn gap(mut self, ms: u64) -> Self {
            self.now += ms;
            self
        }

        /// Key a letter from its `.`/`-` text with mid-band holds and
        /// element gaps from `profile`; no trailing gap
        pub fn letter(mut self, sequence: &str, profile: &TimingProfile) -> Self {
            let dot = (profile.dot_min + profile.dot_max) / 2;
            let dash = (profile.dash_min + profile.dash_max) / 2;
            let element_gap = (profile.element_separator_min + profile.element_separator_max) / 2;

            for (i, c) in sequence.chars().enumerate() {
                if i > 0 {
                    self = self.gap(element_gap);
                }
                self = match c {
                    '.' => self.hold(dot),
                    '-' => self.hold(dash),
                    _ => self,
                };
            }
            self
        }

        /// Key a word of standard-table characters with letter gaps between them
        pub fn word(mut self, text: &str, profile: &TimingProfile) -> Self {
            let letter_gap = (profile.letter_separator_min + profile.letter_separator_max) / 2;

            for (i, c) in text.chars().enumerate() {
                if i > 0 {
                    self = self.gap(letter_gap);
                }
                if let Some(sequence) = sequence_for(c) {
                    self = self.letter(sequence, profile);
                }
            }
            self
        }

        /// Time of the last edge plus any trailing gap
        pub fn end(&self) -> Instant {
            Instant::from_millis(self.now)
        }

        pub fn events(&self) -> &[KeyEvent] {
            &self.events
        }

        pub fn build(self) -> Vec<KeyEvent> {
            self.events
        }
    }

    /// Standard-table sequence for a character (case-insensitive)
    pub fn sequence_for(c: char) -> Option<&'static str> {
        let upper = c.to_ascii_uppercase();
        crate::decoder::STANDARD_TABLE
            .iter()
            .find(|(_, ch)| *ch == upper)
            .map(|(seq, _)| *seq)
    }
}

pub mod output_capture {
    //! Output capture for testing

    use std::sync::{Arc, Mutex};
    use crate::controller::DecoderController;
    use crate::hal::MappingStore;
    use crate::types::{DecoderEvent, Symbol};

    /// Shared event log that can be subscribed to a controller
    #[derive(Debug, Clone, Default)]
    pub struct EventRecorder {
        events: Arc<Mutex<Vec<DecoderEvent>>>,
    }

    impl EventRecorder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Subscribe a clone of this recorder to `controller`
        pub fn attach<S: MappingStore>(&self, controller: &mut DecoderController<S>) {
            let events = self.events.clone();
            controller.subscribe(move |e| {
                if let Ok(mut log) = events.lock() {
                    log.push(e.clone());
                }
            });
        }

        pub fn events(&self) -> Vec<DecoderEvent> {
            self.events.lock().map(|log| log.clone()).unwrap_or_default()
        }

        /// Remove and return everything recorded so far
        pub fn take(&self) -> Vec<DecoderEvent> {
            self.events.lock().map(|mut log| std::mem::take(&mut *log)).unwrap_or_default()
        }

        pub fn words(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    DecoderEvent::WordCompleted(word) => Some(word),
                    _ => None,
                })
                .collect()
        }

        pub fn characters(&self) -> String {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    DecoderEvent::CharacterDecoded { character, .. } => Some(character),
                    _ => None,
                })
                .collect()
        }

        /// Classified presses as `.`/`-` text
        pub fn symbols(&self) -> String {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    DecoderEvent::PressClassified(symbol) => Some(Symbol::as_char(&symbol)),
                    _ => None,
                })
                .collect()
        }

        pub fn count(&self, wanted: &DecoderEvent) -> usize {
            self.events().iter().filter(|e| *e == wanted).count()
        }
    }
}

pub mod replay {
    //! Drive a controller through a script with deadline-accurate polling

    use crate::controller::DecoderController;
    use crate::hal::{Instant, MappingStore};
    use crate::types::KeyEvent;

    /// Feed `events` in order, polling at every deadline that falls between
    /// them, then keep polling deadlines up to `until`
    pub fn replay<S: MappingStore>(controller: &mut DecoderController<S>, events: &[KeyEvent], until: Instant) {
        for event in events {
            advance(controller, event.at);
            controller.handle_event(*event);
        }
        advance(controller, until);
    }

    /// Poll every deadline up to and including `until`
    pub fn advance<S: MappingStore>(controller: &mut DecoderController<S>, until: Instant) {
        while let Some(deadline) = controller.next_deadline() {
            if deadline > until {
                break;
            }
            controller.poll(deadline);
        }
        controller.poll(until);
    }
}
