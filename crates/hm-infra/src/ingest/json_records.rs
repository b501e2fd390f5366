//! Reads marker records from the JSON document produced by the conversion
//! script (a top-level array of record objects).

use std::path::Path;

use anyhow::Context;
use hm_core::MarkerRecord;
use tracing::{debug, warn};

/// Records parsed from one document.
#[derive(Debug, Default)]
pub struct RecordBatch {
    pub records: Vec<MarkerRecord>,
    /// Array elements that could not be read as a record; skipped.
    pub malformed: usize,
}

/// Parse a JSON array of records.
///
/// A malformed element is skipped and counted; only a document that is not a
/// JSON array at all is an error.
pub fn parse_records(json: &str) -> anyhow::Result<RecordBatch> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(json).context("Marker document is not a JSON array")?;

    let mut batch = RecordBatch::default();
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<MarkerRecord>(value) {
            Ok(record) => batch.records.push(record),
            Err(err) => {
                debug!(index, error = %err, "Skipping malformed marker record");
                batch.malformed += 1;
            }
        }
    }
    if batch.malformed > 0 {
        warn!(malformed = batch.malformed, "Some marker records were malformed");
    }
    Ok(batch)
}

/// Read and parse a record document from disk.
pub fn load_records(path: &Path) -> anyhow::Result<RecordBatch> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read marker file: {}", path.display()))?;
    parse_records(&content)
        .with_context(|| format!("Failed to parse marker file: {}", path.display()))
}
