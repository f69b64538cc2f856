//! Checkpoint index over the review store
//!
//! The review store doubles as a record of which movies already have their
//! reviews on disk. It is scanned once at startup into a set of item ids; the
//! crawler keeps the set current as it writes, so per-item checks never
//! rescan the file.

use crate::HarvestError;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Read-only view of which items already have review rows
#[derive(Debug, Clone, Default)]
pub struct CheckpointStore {
    processed: HashSet<String>,
    last_item_id: Option<String>,
    row_count: u64,
}

impl CheckpointStore {
    /// Builds the index from the review store at `path`
    ///
    /// A missing file is not an error: it means nothing has been harvested
    /// yet and the index starts empty.
    pub fn load(path: &Path) -> Result<Self, HarvestError> {
        if !path.exists() {
            tracing::debug!("No review store at {}, starting empty", path.display());
            return Ok(Self::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let mut store = Self::default();
        for record in reader.records() {
            let record = record?;
            let Some(item_id) = record.get(0).filter(|id| !id.is_empty()) else {
                continue;
            };
            store.processed.insert(item_id.to_string());
            store.last_item_id = Some(item_id.to_string());
            store.row_count += 1;
        }

        tracing::debug!(
            "Checkpoint index: {} review rows across {} items",
            store.row_count,
            store.processed.len()
        );

        Ok(store)
    }

    /// Returns true if any review row exists for `item_id`
    pub fn is_processed(&self, item_id: &str) -> bool {
        self.processed.contains(item_id)
    }

    /// Item id on the final row of the store, if any
    pub fn last_processed_item_id(&self) -> Option<&str> {
        self.last_item_id.as_deref()
    }

    /// Records that rows for `item_id` were just written
    pub fn mark_processed(&mut self, item_id: &str) {
        self.processed.insert(item_id.to_string());
        self.last_item_id = Some(item_id.to_string());
    }

    /// Number of distinct items with review rows
    pub fn item_count(&self) -> usize {
        self.processed.len()
    }

    /// Number of review rows seen at load time
    pub fn row_count(&self) -> u64 {
        self.row_count
    }
}

/// Removes every row belonging to `item_id` from the review store
///
/// The store is rewritten into a sibling temporary file which then replaces
/// the original, so an interruption leaves either the old or the new file.
///
/// # Returns
///
/// The number of rows removed. A missing store removes nothing. A file whose
/// first header column is not `Id` is left alone and reported as an error.
pub fn purge_item(path: &Path, item_id: &str) -> Result<u64, HarvestError> {
    if !path.exists() {
        return Ok(0);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    if !headers
        .get(0)
        .is_some_and(|column| column.trim().eq_ignore_ascii_case("id"))
    {
        return Err(HarvestError::Store(format!(
            "{} does not look like a review store (first column is {:?}); refusing to rewrite it",
            path.display(),
            headers.get(0).unwrap_or("")
        )));
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".purge");
    let tmp_path = Path::new(&tmp_name);

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(tmp_path)?;
    writer.write_record(&headers)?;

    let mut removed = 0;
    for record in reader.records() {
        let record = record?;
        if record.get(0) == Some(item_id) {
            removed += 1;
            continue;
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    drop(writer);

    if removed == 0 {
        fs::remove_file(tmp_path)?;
        return Ok(0);
    }

    fs::rename(tmp_path, path)?;
    tracing::info!(
        "Removed {} partial review rows for item {} from {}",
        removed,
        item_id,
        path.display()
    );

    Ok(removed)
}
