//! Mapping between tokio time and decoder timestamps

use decoder_core::Instant;

/// Millisecond clock anchored at construction.
///
/// Decoder timestamps are milliseconds since `origin`, so the same instant
/// can be turned back into a tokio deadline.
#[derive(Copy, Clone, Debug)]
pub struct HostClock {
    origin: tokio::time::Instant,
}

impl HostClock {
    pub fn new() -> Self {
        Self { origin: tokio::time::Instant::now() }
    }

    pub fn with_origin(origin: tokio::time::Instant) -> Self {
        Self { origin }
    }

    /// Current time as a decoder timestamp
    pub fn now(&self) -> Instant {
        self.at(tokio::time::Instant::now())
    }

    /// Convert a tokio instant; instants before the origin clamp to zero
    pub fn at(&self, instant: tokio::time::Instant) -> Instant {
        let elapsed = instant.saturating_duration_since(self.origin);
        Instant::from_millis(elapsed.as_millis() as u64)
    }

    /// Tokio deadline for a decoder timestamp
    pub fn to_tokio(&self, instant: Instant) -> tokio::time::Instant {
        self.origin + std::time::Duration::from_millis(instant.as_millis())
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}
