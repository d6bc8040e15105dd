//! Core data types for the Morse decoder

use alloc::string::String;
use crate::hal::{Duration, Instant, StoreError};

/// Morse code elements
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Symbol {
    /// Short element
    Dot,
    /// Long element
    Dash,
}

impl Symbol {
    /// Textual form used in sequence strings
    pub const fn as_char(&self) -> char {
        match self {
            Symbol::Dot => '.',
            Symbol::Dash => '-',
        }
    }

    /// Parse one sequence character
    pub const fn from_char(c: char) -> Option<Symbol> {
        match c {
            '.' => Some(Symbol::Dot),
            '-' => Some(Symbol::Dash),
            _ => None,
        }
    }
}

/// Result of classifying a key hold duration
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressClass {
    Dot,
    Dash,
    /// In neither the dot nor the dash band
    Invalid,
}

impl PressClass {
    pub const fn symbol(&self) -> Option<Symbol> {
        match self {
            PressClass::Dot => Some(Symbol::Dot),
            PressClass::Dash => Some(Symbol::Dash),
            PressClass::Invalid => None,
        }
    }
}

/// Result of classifying a silence duration, longest category first
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PauseClass {
    Word,
    Letter,
    Element,
    None,
}

/// Key press FSM states
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressState {
    /// Waiting for a press
    Idle,
    /// Designated key held down
    Pressing,
    /// Press classified, settling before the next press is accepted
    Processing,
}

/// Silence boundary produced by the pause scheduler
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Boundary {
    Letter,
    Word,
}

/// Host key code of the input being decoded
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyCode(pub u32);

impl KeyCode {
    /// Spacebar
    pub const SPACE: KeyCode = KeyCode(32);
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyAction {
    Press,
    Release,
}

/// Filtered key edge delivered by the input collaborator
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub action: KeyAction,
    pub at: Instant,
}

impl KeyEvent {
    pub const fn press(key: KeyCode, at: Instant) -> Self {
        Self { key, action: KeyAction::Press, at }
    }

    pub const fn release(key: KeyCode, at: Instant) -> Self {
        Self { key, action: KeyAction::Release, at }
    }
}

/// Output events for the presentation layer
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DecoderEvent {
    /// A press was classified as a dot or a dash
    PressClassified(Symbol),
    /// A press fell outside both bands; carries the raw hold time in ms
    InvalidPress(u64),
    /// A letter was resolved (or replaced by the placeholder). A sequence
    /// longer than `MAX_SEQUENCE_LEN` is cut there and ends in `OVERLONG_MARK`.
    CharacterDecoded { character: char, sequence: String },
    /// The current letter was closed
    LetterBoundary,
    /// The current word was closed
    WordCompleted(String),
}

/// Custom mapping mutation errors
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MappingError {
    /// Sequence already maps to a character in either table
    DuplicateSequence,
    /// Character is already reachable from either table
    DuplicateCharacter,
    /// Sequence is empty, too long, or contains something other than `.`/`-`
    InvalidSequence,
    /// Character cannot be used as a mapping target
    InvalidCharacter,
    /// Mutation was applied but could not be persisted, and was rolled back
    Store(StoreError),
}

#[cfg(feature = "std")]
impl core::fmt::Display for MappingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MappingError::DuplicateSequence => write!(f, "Morse sequence already exists"),
            MappingError::DuplicateCharacter => write!(f, "Character already exists"),
            MappingError::InvalidSequence => write!(f, "Invalid Morse sequence"),
            MappingError::InvalidCharacter => write!(f, "Invalid mapping character"),
            MappingError::Store(e) => write!(f, "Failed to persist mapping: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MappingError {}

impl From<StoreError> for MappingError {
    fn from(e: StoreError) -> Self {
        MappingError::Store(e)
    }
}

/// Decoder-level errors
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderError {
    /// Speed must be a positive WPM value
    InvalidSpeed,
    /// Mapping store failed while loading
    Store(StoreError),
}

impl From<StoreError> for DecoderError {
    fn from(e: StoreError) -> Self {
        DecoderError::Store(e)
    }
}

#[cfg(feature = "std")]
impl core::fmt::Display for DecoderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DecoderError::InvalidSpeed => write!(f, "WPM must be greater than zero"),
            DecoderError::Store(e) => write!(f, "Failed to load mappings: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecoderError {}

/// Decoder configuration parameters
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DecoderConfig {
    /// Keying speed in words per minute
    pub wpm: u32,
    /// Designated input
    pub key: KeyCode,
    /// Holds shorter than this are contact bounce
    pub debounce: Duration,
    /// Time spent in Processing before the next press is accepted
    pub settle: Duration,
    /// Consult the custom table before the standard one
    pub custom_lookup_enabled: bool,
    /// Emit a placeholder for unknown sequences instead of dropping them
    pub represent_unknown_enabled: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            wpm: 10,
            key: KeyCode::SPACE,
            debounce: Duration::from_millis(50),
            settle: Duration::from_millis(50),
            custom_lookup_enabled: true,
            represent_unknown_enabled: true,
        }
    }
}

impl DecoderConfig {
    /// Create a new configuration with validation
    pub fn new(wpm: u32, key: KeyCode, debounce_ms: u64, settle_ms: u64) -> Result<Self, &'static str> {
        if wpm == 0 {
            return Err("WPM must be greater than zero");
        }
        if debounce_ms > 200 {
            return Err("Debounce must be <= 200ms");
        }
        if settle_ms > 200 {
            return Err("Settle time must be <= 200ms");
        }

        Ok(Self {
            wpm,
            key,
            debounce: Duration::from_millis(debounce_ms),
            settle: Duration::from_millis(settle_ms),
            ..Self::default()
        })
    }

    /// Builder-style policy override
    pub fn with_policies(mut self, custom_lookup: bool, represent_unknown: bool) -> Self {
        self.custom_lookup_enabled = custom_lookup;
        self.represent_unknown_enabled = represent_unknown;
        self
    }
}
