//! Speed-derived duration thresholds and press/pause classification

use crate::hal::Duration;
use crate::types::{DecoderError, PauseClass, PressClass};

/// Thresholds are defined at this speed and scaled to the configured one
pub const BASELINE_WPM: u32 = 10;

// 10 WPM baseline, milliseconds
const DOT_MIN: u64 = 50;
const DOT_MAX: u64 = 200;
const DASH_MIN: u64 = 300;
const DASH_MAX: u64 = 800;
const ELEMENT_SEPARATOR_MIN: u64 = 50;
const ELEMENT_SEPARATOR_MAX: u64 = 300;
const LETTER_SEPARATOR_MIN: u64 = 500;
const LETTER_SEPARATOR_MAX: u64 = 1200;
const WORD_SEPARATOR_MIN: u64 = 1500;

/// Derived thresholds in milliseconds.
///
/// Ordering holds for every positive speed:
/// `dot_min <= dot_max < dash_min <= dash_max` and
/// `element_separator_min < letter_separator_min < word_separator_min`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingProfile {
    pub dot_min: u64,
    pub dot_max: u64,
    pub dash_min: u64,
    pub dash_max: u64,
    pub element_separator_min: u64,
    pub element_separator_max: u64,
    pub letter_separator_min: u64,
    pub letter_separator_max: u64,
    pub word_separator_min: u64,
}

impl TimingProfile {
    /// Scale the baseline thresholds to `wpm` (must be non-zero)
    fn for_wpm(wpm: u32) -> Self {
        // round(base * BASELINE_WPM / wpm), halves rounded up
        let scale = |base: u64| {
            let wpm = wpm as u64;
            (base * BASELINE_WPM as u64 * 2 + wpm) / (2 * wpm)
        };

        // At extreme speeds rounding collapses neighbouring bands; keep them apart.
        let dot_min = scale(DOT_MIN);
        let dot_max = scale(DOT_MAX).max(dot_min);
        let dash_min = scale(DASH_MIN).max(dot_max + 1);
        let dash_max = scale(DASH_MAX).max(dash_min);
        let element_separator_min = scale(ELEMENT_SEPARATOR_MIN);
        let element_separator_max = scale(ELEMENT_SEPARATOR_MAX).max(element_separator_min);
        let letter_separator_min = scale(LETTER_SEPARATOR_MIN).max(element_separator_min + 1);
        let letter_separator_max = scale(LETTER_SEPARATOR_MAX).max(letter_separator_min);
        let word_separator_min = scale(WORD_SEPARATOR_MIN).max(letter_separator_min + 1);

        Self {
            dot_min,
            dot_max,
            dash_min,
            dash_max,
            element_separator_min,
            element_separator_max,
            letter_separator_min,
            letter_separator_max,
            word_separator_min,
        }
    }

    /// Silence after the last action that closes a letter
    pub fn letter_gap(&self) -> Duration {
        Duration::from_millis(self.letter_separator_min)
    }

    /// Silence after the last action that closes a word
    pub fn word_gap(&self) -> Duration {
        Duration::from_millis(self.word_separator_min)
    }

    /// Check the ordering invariant
    pub fn is_ordered(&self) -> bool {
        self.dot_min <= self.dot_max
            && self.dot_max < self.dash_min
            && self.dash_min <= self.dash_max
            && self.element_separator_min < self.letter_separator_min
            && self.letter_separator_min < self.word_separator_min
    }
}

/// Converts a speed setting into thresholds and classifies durations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimingClassifier {
    wpm: u32,
    profile: TimingProfile,
}

impl Default for TimingClassifier {
    fn default() -> Self {
        Self {
            wpm: BASELINE_WPM,
            profile: TimingProfile::for_wpm(BASELINE_WPM),
        }
    }
}

impl TimingClassifier {
    /// Create a classifier for the given speed
    pub fn new(wpm: u32) -> Result<Self, DecoderError> {
        let mut classifier = Self::default();
        classifier.set_speed(wpm)?;
        Ok(classifier)
    }

    /// Change speed; the whole profile is replaced at once.
    /// Zero is rejected and leaves the current profile in place.
    pub fn set_speed(&mut self, wpm: u32) -> Result<(), DecoderError> {
        if wpm == 0 {
            return Err(DecoderError::InvalidSpeed);
        }
        self.wpm = wpm;
        self.profile = TimingProfile::for_wpm(wpm);

        #[cfg(feature = "defmt")]
        defmt::debug!("speed {} WPM, profile {}", wpm, self.profile);

        Ok(())
    }

    /// Current speed in words per minute
    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    /// Dot unit in milliseconds (PARIS standard: 50 units per word)
    pub fn unit_ms(&self) -> f32 {
        1200.0 / self.wpm as f32
    }

    /// Snapshot of the current thresholds
    pub fn thresholds(&self) -> TimingProfile {
        self.profile
    }

    /// Classify a hold duration; both bands are closed intervals
    pub fn classify_press(&self, duration_ms: u64) -> PressClass {
        let p = &self.profile;
        if (p.dot_min..=p.dot_max).contains(&duration_ms) {
            PressClass::Dot
        } else if (p.dash_min..=p.dash_max).contains(&duration_ms) {
            PressClass::Dash
        } else {
            PressClass::Invalid
        }
    }

    /// Classify a silence duration, longest category first
    pub fn classify_pause(&self, duration_ms: u64) -> PauseClass {
        let p = &self.profile;
        if duration_ms >= p.word_separator_min {
            PauseClass::Word
        } else if duration_ms >= p.letter_separator_min {
            PauseClass::Letter
        } else if duration_ms >= p.element_separator_min {
            PauseClass::Element
        } else {
            PauseClass::None
        }
    }
}

/// Achieved speed for `characters` keyed over `elapsed` (5 characters per word)
pub fn words_per_minute(characters: usize, elapsed: Duration) -> f32 {
    let ms = elapsed.as_millis();
    if ms == 0 {
        return 0.0;
    }
    let words = characters as f32 / 5.0;
    words / (ms as f32 / 60_000.0)
}
