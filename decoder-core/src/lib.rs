#![cfg_attr(not(any(feature = "std", test)), no_std)]

//! # Decoder Core
//!
//! Straight-key Morse decoding library.
//! Classifies press durations against speed-scaled thresholds, assembles
//! symbols into letters and words, and closes them from a single idle period.

extern crate alloc;

pub mod types;
pub mod hal;
pub mod timing;
pub mod fsm;
pub mod decoder;
pub mod scheduler;
pub mod events;
pub mod controller;

#[cfg(feature = "test-utils")]
pub mod test_utils;


pub use types::*;
pub use hal::{CustomTable, Duration, Instant, MappingStore, MemoryStore, StoreError};
pub use timing::{words_per_minute, TimingClassifier, TimingProfile};
pub use fsm::{KeyPressFsm, PressOutcome};
pub use decoder::{
    parse_sequence, standard_lookup, SequenceDecoder, MAX_SEQUENCE_LEN, OVERLONG_MARK, PLACEHOLDER, STANDARD_TABLE,
};
pub use scheduler::PauseScheduler;
pub use events::{EventBus, EventSink, ListenerId};
pub use controller::*;

/// Decoder library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration: 10 WPM on the spacebar, both policies enabled
pub fn default_config() -> DecoderConfig {
    DecoderConfig {
        wpm: 10,
        key: KeyCode::SPACE,
        debounce: Duration::from_millis(50),
        settle: Duration::from_millis(50),
        custom_lookup_enabled: true,
        represent_unknown_enabled: true,
    }
}
