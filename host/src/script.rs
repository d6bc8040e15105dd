//! Keying script parser
//!
//! One edge per line, timestamps in milliseconds from the start of the run:
//!
//! ```text
//! # S
//! down 0
//! up 100
//! down 200
//! up 300
//! ```
//!
//! Blank lines and `#` comments are skipped. Timestamps must not go backwards.

use std::fmt;

use decoder_core::{DecoderController, Instant, KeyCode, KeyEvent, MappingStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// Line is not `down <ms>` or `up <ms>`
    Syntax { line: usize, text: String },
    /// Timestamp is earlier than the previous edge
    OutOfOrder { line: usize, at: u64, previous: u64 },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Syntax { line, text } => {
                write!(f, "line {}: expected `down <ms>` or `up <ms>`, found `{}`", line, text)
            }
            ScriptError::OutOfOrder { line, at, previous } => {
                write!(f, "line {}: time {} ms is before previous edge at {} ms", line, at, previous)
            }
        }
    }
}

impl std::error::Error for ScriptError {}

/// Parse a script into edges on `key`
pub fn parse_script(source: &str, key: KeyCode) -> Result<Vec<KeyEvent>, ScriptError> {
    let mut events = Vec::new();
    let mut previous = 0u64;

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.split('#').next().unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }

        let syntax = || ScriptError::Syntax { line, text: text.to_string() };

        let mut parts = text.split_whitespace();
        let (action, at) = match (parts.next(), parts.next(), parts.next()) {
            (Some(action), Some(at), None) => (action, at.parse::<u64>().map_err(|_| syntax())?),
            _ => return Err(syntax()),
        };

        if at < previous {
            return Err(ScriptError::OutOfOrder { line, at, previous });
        }
        previous = at;

        let instant = Instant::from_millis(at);
        let event = match action.to_ascii_lowercase().as_str() {
            "down" => KeyEvent::press(key, instant),
            "up" => KeyEvent::release(key, instant),
            _ => return Err(syntax()),
        };
        events.push(event);
    }

    Ok(events)
}

/// Run `events` through `controller` on virtual time.
///
/// Every deadline that falls before an edge is polled first, and after the
/// last edge the controller is polled until nothing is pending, so the final
/// letter and word are closed.
pub fn replay<S: MappingStore>(controller: &mut DecoderController<S>, events: &[KeyEvent]) {
    for event in events {
        while let Some(deadline) = controller.next_deadline().filter(|d| *d <= event.at) {
            controller.poll(deadline);
        }
        controller.handle_event(*event);
    }

    while let Some(deadline) = controller.next_deadline() {
        controller.poll(deadline);
    }
}
