//! Host abstraction layer: time types and the custom-mapping store

// Re-export time types based on feature
#[cfg(feature = "embassy-time")]
pub use embassy_time::{Duration, Instant};

#[cfg(not(feature = "embassy-time"))]
pub use self::mock_time::{Duration, Instant};

#[cfg(not(feature = "embassy-time"))]
mod mock_time {
    /// Millisecond timestamp supplied by the host with each input event
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Instant(u64);

    impl Instant {
        pub const fn from_millis(ms: u64) -> Self {
            Self(ms)
        }

        pub const fn as_millis(&self) -> u64 {
            self.0
        }

        pub fn saturating_duration_since(&self, earlier: Instant) -> Duration {
            Duration::from_millis(self.0.saturating_sub(earlier.0))
        }

        pub fn checked_add(&self, duration: Duration) -> Option<Instant> {
            self.0.checked_add(duration.as_millis()).map(Instant)
        }
    }

    impl core::ops::Add<Duration> for Instant {
        type Output = Instant;

        fn add(self, rhs: Duration) -> Instant {
            Instant(self.0 + rhs.as_millis())
        }
    }

    /// Millisecond duration
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Duration(u64);

    impl Duration {
        pub const fn from_millis(ms: u64) -> Self {
            Self(ms)
        }

        pub const fn as_millis(&self) -> u64 {
            self.0
        }
    }

    impl core::ops::Add for Duration {
        type Output = Duration;

        fn add(self, rhs: Duration) -> Duration {
            Duration(self.0 + rhs.0)
        }
    }

    impl core::ops::Sub for Duration {
        type Output = Duration;

        fn sub(self, rhs: Duration) -> Duration {
            Duration(self.0 - rhs.0)
        }
    }

    impl core::ops::Mul<u32> for Duration {
        type Output = Duration;

        fn mul(self, rhs: u32) -> Duration {
            Duration(self.0 * rhs as u64)
        }
    }

    impl core::ops::Div<u32> for Duration {
        type Output = Duration;

        fn div(self, rhs: u32) -> Duration {
            Duration(self.0 / rhs as u64)
        }
    }
}

use alloc::collections::BTreeMap;
use alloc::string::String;

/// In-memory custom table: sequence string (`.`/`-`) to character
pub type CustomTable = BTreeMap<String, char>;

/// Error types for mapping store operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Backing storage could not be read or written
    Io,
    /// Stored data is malformed or violates table uniqueness
    Corrupt,
    /// Store refused the operation
    Unavailable,
}

#[cfg(feature = "std")]
impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StoreError::Io => write!(f, "Mapping store I/O failed"),
            StoreError::Corrupt => write!(f, "Stored mappings are corrupt"),
            StoreError::Unavailable => write!(f, "Mapping store unavailable"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StoreError {}

/// Persistence for the custom table.
///
/// `load` runs once when a decoder is built; `save` runs synchronously after
/// every successful mutation with the complete table.
pub trait MappingStore {
    /// Read the persisted table
    fn load(&mut self) -> Result<CustomTable, StoreError>;

    /// Replace the persisted table
    fn save(&mut self, table: &CustomTable) -> Result<(), StoreError>;
}

impl<S: MappingStore + ?Sized> MappingStore for &mut S {
    fn load(&mut self) -> Result<CustomTable, StoreError> {
        (**self).load()
    }

    fn save(&mut self, table: &CustomTable) -> Result<(), StoreError> {
        (**self).save(table)
    }
}

impl<S: MappingStore + ?Sized> MappingStore for alloc::boxed::Box<S> {
    fn load(&mut self) -> Result<CustomTable, StoreError> {
        (**self).load()
    }

    fn save(&mut self, table: &CustomTable) -> Result<(), StoreError> {
        (**self).save(table)
    }
}

/// Volatile store for hosts without persistence
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    table: CustomTable,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously persisted table
    pub fn with_table(table: CustomTable) -> Self {
        Self { table, saves: 0 }
    }

    /// Last saved table
    pub fn table(&self) -> &CustomTable {
        &self.table
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl MappingStore for MemoryStore {
    fn load(&mut self) -> Result<CustomTable, StoreError> {
        Ok(self.table.clone())
    }

    fn save(&mut self, table: &CustomTable) -> Result<(), StoreError> {
        self.table = table.clone();
        self.saves += 1;
        Ok(())
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock stores for testing

    use super::*;

    /// Store whose writes can be made to fail on demand
    #[derive(Debug, Default)]
    pub struct FlakyStore {
        pub inner: MemoryStore,
        pub fail_saves: bool,
        pub fail_load: bool,
    }

    impl FlakyStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_saves() -> Self {
            Self { fail_saves: true, ..Self::default() }
        }
    }

    impl MappingStore for FlakyStore {
        fn load(&mut self) -> Result<CustomTable, StoreError> {
            if self.fail_load {
                return Err(StoreError::Io);
            }
            self.inner.load()
        }

        fn save(&mut self, table: &CustomTable) -> Result<(), StoreError> {
            if self.fail_saves {
                return Err(StoreError::Unavailable);
            }
            self.inner.save(table)
        }
    }
}
