//! Load record archives and write delta artifacts

use crate::core::error::Result;
use crate::records::store::{Corpus, Delta};
use crate::records::Record;
use std::fs;
use std::path::Path;

/// Load a corpus archive (a JSON array of records) from disk
pub fn load_corpus(path: &Path) -> Result<Corpus> {
    let content = fs::read_to_string(path)?;
    let records: Vec<Record> = serde_json::from_str(&content)?;
    tracing::info!(
        records = records.len(),
        path = %path.display(),
        "corpus archive loaded"
    );
    Ok(Corpus::from_records(records))
}

/// Write the run's delta artifact as pretty-printed JSON.
///
/// Output ordering is fully deterministic: created records ascend by id and
/// every collection in the model is a BTree type.
pub fn write_delta(path: &Path, delta: &Delta) -> Result<()> {
    let json = serde_json::to_string_pretty(delta)?;
    fs::write(path, json)?;
    tracing::info!(
        created = delta.created.len(),
        overrides = delta.overrides.len(),
        path = %path.display(),
        "delta artifact written"
    );
    Ok(())
}
