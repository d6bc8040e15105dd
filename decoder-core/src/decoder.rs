//! Sequence decoder: symbols to characters, characters to words

use alloc::string::String;
use heapless::Vec as SeqVec;
use crate::events::EventSink;
use crate::hal::{CustomTable, MappingStore, StoreError};
use crate::types::{DecoderConfig, DecoderEvent, MappingError, Symbol};

/// Longest sequence that can be mapped; longer input never resolves
pub const MAX_SEQUENCE_LEN: usize = 16;

/// Emitted in place of an unknown sequence when enabled
pub const PLACEHOLDER: char = '\u{FFFD}';

/// Appended to the text of a sequence that ran past [`MAX_SEQUENCE_LEN`]
pub const OVERLONG_MARK: char = '\u{2026}';

/// International Morse letters and digits
pub const STANDARD_TABLE: [(&str, char); 36] = [
    (".-", 'A'),
    ("-...", 'B'),
    ("-.-.", 'C'),
    ("-..", 'D'),
    (".", 'E'),
    ("..-.", 'F'),
    ("--.", 'G'),
    ("....", 'H'),
    ("..", 'I'),
    (".---", 'J'),
    ("-.-", 'K'),
    (".-..", 'L'),
    ("--", 'M'),
    ("-.", 'N'),
    ("---", 'O'),
    (".--.", 'P'),
    ("--.-", 'Q'),
    (".-.", 'R'),
    ("...", 'S'),
    ("-", 'T'),
    ("..-", 'U'),
    ("...-", 'V'),
    (".--", 'W'),
    ("-..-", 'X'),
    ("-.--", 'Y'),
    ("--..", 'Z'),
    (".----", '1'),
    ("..---", '2'),
    ("...--", '3'),
    ("....-", '4'),
    (".....", '5'),
    ("-....", '6'),
    ("--...", '7'),
    ("---..", '8'),
    ("----.", '9'),
    ("-----", '0'),
];

/// Look up a sequence in the standard table
pub fn standard_lookup(sequence: &str) -> Option<char> {
    STANDARD_TABLE
        .iter()
        .find(|(seq, _)| *seq == sequence)
        .map(|(_, c)| *c)
}

fn standard_has_char(character: char) -> bool {
    STANDARD_TABLE.iter().any(|(_, c)| *c == character)
}

/// Check a custom sequence: non-empty, `.`/`-` only, bounded length
pub fn is_valid_sequence(sequence: &str) -> bool {
    !sequence.is_empty()
        && sequence.len() <= MAX_SEQUENCE_LEN
        && sequence.chars().all(|c| Symbol::from_char(c).is_some())
}

/// Parse `.`/`-` text into symbols; `None` if it is not a valid sequence
pub fn parse_sequence(sequence: &str) -> Option<SeqVec<Symbol, MAX_SEQUENCE_LEN>> {
    if !is_valid_sequence(sequence) {
        return None;
    }
    sequence.chars().map(Symbol::from_char).collect()
}

fn is_valid_target(character: char) -> bool {
    character != PLACEHOLDER && !character.is_whitespace() && !character.is_control()
}

/// Upper case form of a mapped character when that is a single character
fn normalize_target(character: char) -> char {
    let mut upper = character.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(c), None) => c,
        _ => character,
    }
}

/// Accumulates symbols into letters and letters into words.
///
/// The custom table is owned here and mirrored to `store` after every
/// successful mutation.
pub struct SequenceDecoder<S: MappingStore> {
    store: S,
    custom: CustomTable,
    sequence: SeqVec<Symbol, MAX_SEQUENCE_LEN>,
    overlong: bool,
    word: String,
    custom_lookup_enabled: bool,
    represent_unknown_enabled: bool,
}

impl<S: MappingStore> SequenceDecoder<S> {
    /// Load the custom table from `store`; both policies start enabled
    pub fn new(mut store: S) -> Result<Self, StoreError> {
        let custom = store.load()?;
        if !Self::table_is_consistent(&custom) {
            #[cfg(feature = "defmt")]
            defmt::warn!("stored custom table rejected");
            return Err(StoreError::Corrupt);
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("loaded {} custom mappings", custom.len());

        Ok(Self {
            store,
            custom,
            sequence: SeqVec::new(),
            overlong: false,
            word: String::new(),
            custom_lookup_enabled: true,
            represent_unknown_enabled: true,
        })
    }

    /// Load and apply the policy flags from `config`
    pub fn with_config(store: S, config: &DecoderConfig) -> Result<Self, StoreError> {
        let mut decoder = Self::new(store)?;
        decoder.custom_lookup_enabled = config.custom_lookup_enabled;
        decoder.represent_unknown_enabled = config.represent_unknown_enabled;
        Ok(decoder)
    }

    /// Loaded tables must uphold the same uniqueness rules as mutations
    fn table_is_consistent(table: &CustomTable) -> bool {
        let mut seen = alloc::collections::BTreeSet::new();
        table.iter().all(|(sequence, &character)| {
            is_valid_sequence(sequence)
                && is_valid_target(character)
                && standard_lookup(sequence).is_none()
                && !standard_has_char(normalize_target(character))
                && seen.insert(normalize_target(character))
        })
    }

    /// Append one symbol to the current letter
    pub fn add_element(&mut self, symbol: Symbol) {
        if self.sequence.push(symbol).is_err() {
            self.overlong = true;
        }
    }

    /// Resolve the current sequence under the active policies
    fn lookup(&self, sequence: &str) -> Option<char> {
        if self.custom_lookup_enabled {
            if let Some(&c) = self.custom.get(sequence) {
                return Some(c);
            }
        }
        standard_lookup(sequence)
    }

    /// Current sequence as `.`/`-` text. An overlong sequence is cut at the
    /// bound and ends in [`OVERLONG_MARK`].
    pub fn current_sequence(&self) -> String {
        let mut text: String = self.sequence.iter().map(Symbol::as_char).collect();
        if self.overlong {
            text.push(OVERLONG_MARK);
        }
        text
    }

    /// Close the current letter
    pub fn end_letter<E: EventSink + ?Sized>(&mut self, events: &mut E) {
        let sequence = self.current_sequence();
        let resolved = if self.overlong { None } else { self.lookup(&sequence) };

        match resolved {
            Some(character) => {
                self.word.push(character);
                events.emit(DecoderEvent::CharacterDecoded { character, sequence });
            }
            None if self.represent_unknown_enabled => {
                self.word.push(PLACEHOLDER);
                events.emit(DecoderEvent::CharacterDecoded { character: PLACEHOLDER, sequence });
            }
            None => {
                #[cfg(feature = "defmt")]
                defmt::debug!("unknown sequence dropped");
            }
        }

        self.sequence.clear();
        self.overlong = false;
        events.emit(DecoderEvent::LetterBoundary);
    }

    /// Close the current word; an empty word produces nothing
    pub fn end_word<E: EventSink + ?Sized>(&mut self, events: &mut E) {
        if self.word.is_empty() {
            return;
        }
        let word = core::mem::take(&mut self.word);
        events.emit(DecoderEvent::WordCompleted(word));
    }

    /// What the current sequence would decode to right now
    pub fn preview(&self) -> Option<char> {
        if self.sequence.is_empty() {
            return None;
        }
        let resolved = if self.overlong { None } else { self.lookup(&self.current_sequence()) };
        match resolved {
            Some(c) => Some(c),
            None if self.represent_unknown_enabled => Some(PLACEHOLDER),
            None => None,
        }
    }

    /// Characters decoded since the last word boundary
    pub fn current_word(&self) -> &str {
        &self.word
    }

    /// Drop the current sequence and word without emitting anything
    pub fn clear(&mut self) {
        self.sequence.clear();
        self.overlong = false;
        self.word.clear();
    }

    /// Add a user mapping. Rejected calls leave the table untouched.
    ///
    /// Letters are stored upper case, so `'a'` collides with the standard `'A'`.
    pub fn add_custom_mapping(&mut self, character: char, sequence: &str) -> Result<(), MappingError> {
        let character = normalize_target(character);
        if !is_valid_sequence(sequence) {
            return Err(MappingError::InvalidSequence);
        }
        if !is_valid_target(character) {
            return Err(MappingError::InvalidCharacter);
        }
        if standard_lookup(sequence).is_some() || self.custom.contains_key(sequence) {
            return Err(MappingError::DuplicateSequence);
        }
        if standard_has_char(character) || self.custom.values().any(|&c| c == character) {
            return Err(MappingError::DuplicateCharacter);
        }

        self.custom.insert(String::from(sequence), character);
        if let Err(e) = self.store.save(&self.custom) {
            self.custom.remove(sequence);
            return Err(MappingError::Store(e));
        }

        #[cfg(feature = "defmt")]
        defmt::info!("custom mapping {=str} -> {}", sequence, character);

        Ok(())
    }

    /// Remove a user mapping; absent sequences are not an error
    pub fn remove_custom_mapping(&mut self, sequence: &str) -> Result<(), MappingError> {
        let Some(character) = self.custom.remove(sequence) else {
            return Ok(());
        };
        if let Err(e) = self.store.save(&self.custom) {
            self.custom.insert(String::from(sequence), character);
            return Err(MappingError::Store(e));
        }

        #[cfg(feature = "defmt")]
        defmt::info!("custom mapping {=str} removed", sequence);

        Ok(())
    }

    /// Snapshot of the custom table
    pub fn custom_mappings(&self) -> &CustomTable {
        &self.custom
    }

    pub fn set_custom_lookup_enabled(&mut self, enabled: bool) {
        self.custom_lookup_enabled = enabled;
    }

    pub fn custom_lookup_enabled(&self) -> bool {
        self.custom_lookup_enabled
    }

    pub fn set_represent_unknown_enabled(&mut self, enabled: bool) {
        self.represent_unknown_enabled = enabled;
    }

    pub fn represent_unknown_enabled(&self) -> bool {
        self.represent_unknown_enabled
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
