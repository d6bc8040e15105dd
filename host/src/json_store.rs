//! File-backed custom mapping store
//!
//! The table is a flat JSON object from sequence to character:
//!
//! ```json
//! { ".-.-.": "+", "-..-.": "/" }
//! ```

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use decoder_core::{CustomTable, MappingStore, StoreError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// On-disk layout: a flat object of sequence to one-character string
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct StoredTable(BTreeMap<String, String>);

/// Persists the custom table as JSON at `path`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

/// Parse stored JSON; every value must be exactly one character
pub fn parse_table(content: &str) -> Result<CustomTable, StoreError> {
    let StoredTable(raw) = serde_json::from_str(content).map_err(|e| {
        warn!(error = %e, "stored mappings are not a JSON string map");
        StoreError::Corrupt
    })?;

    raw.into_iter()
        .map(|(sequence, value)| {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(character), None) => Ok((sequence, character)),
                _ => {
                    warn!(%sequence, %value, "stored mapping target is not a single character");
                    Err(StoreError::Corrupt)
                }
            }
        })
        .collect()
}

/// Render the table in the stored JSON layout
pub fn render_table(table: &CustomTable) -> Result<String, StoreError> {
    let stored = StoredTable(
        table
            .iter()
            .map(|(sequence, character)| (sequence.clone(), character.to_string()))
            .collect(),
    );

    serde_json::to_string_pretty(&stored).map_err(|_| StoreError::Corrupt)
}

impl MappingStore for JsonFileStore {
    fn load(&mut self) -> Result<CustomTable, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored mappings");
                return Ok(CustomTable::new());
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read mappings");
                return Err(StoreError::Io);
            }
        };

        let table = parse_table(&content)?;
        debug!(path = %self.path.display(), count = table.len(), "loaded custom mappings");
        Ok(table)
    }

    fn save(&mut self, table: &CustomTable) -> Result<(), StoreError> {
        let content = render_table(table)?;
        let temp_path = self.temp_path();

        std::fs::write(&temp_path, content).map_err(|e| {
            warn!(path = %temp_path.display(), error = %e, "failed to write temporary mappings file");
            StoreError::Io
        })?;

        std::fs::rename(&temp_path, &self.path).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "failed to replace mappings file");
            StoreError::Io
        })?;

        debug!(path = %self.path.display(), count = table.len(), "saved custom mappings");
        Ok(())
    }
}
