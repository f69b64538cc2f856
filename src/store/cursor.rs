//! Explicit crawl cursor
//!
//! The cursor is a small JSON document recording the last movie whose whole
//! pipeline finished and the movie whose reviews are currently being written.
//! It is rewritten atomically after every transition so an interrupted run
//! always leaves a readable cursor behind.

use crate::HarvestError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Persisted resume position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlCursor {
    /// Last item whose metadata and reviews were fully written
    pub last_completed_item_id: Option<String>,

    /// Item whose review rows were being written when the cursor was saved
    pub in_progress_item_id: Option<String>,

    /// Item to reprocess before anything after it, set when resuming from a
    /// review store that had no cursor
    #[serde(default)]
    pub resume_at_item_id: Option<String>,

    /// When the cursor was last saved
    pub updated_at: Option<DateTime<Utc>>,
}

/// Owns the cursor file and its in-memory copy
#[derive(Debug)]
pub struct CursorStore {
    path: PathBuf,
    cursor: CrawlCursor,
}

impl CursorStore {
    /// Reads the cursor at `path`, returning `None` if there is no cursor yet
    pub fn load(path: &Path) -> Result<Option<CrawlCursor>, HarvestError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let cursor = serde_json::from_str(&content)?;
        Ok(Some(cursor))
    }

    /// Wraps an already-loaded cursor; nothing is written until it changes
    pub fn new(path: &Path, cursor: CrawlCursor) -> Self {
        Self {
            path: path.to_path_buf(),
            cursor,
        }
    }

    /// Current cursor contents
    pub fn cursor(&self) -> &CrawlCursor {
        &self.cursor
    }

    /// Marks `item_id` as having review rows in flight
    pub fn begin(&mut self, item_id: &str) -> Result<(), HarvestError> {
        self.cursor.in_progress_item_id = Some(item_id.to_string());
        self.save()
    }

    /// Marks `item_id` as fully processed and advances the resume position
    pub fn complete(&mut self, item_id: &str) -> Result<(), HarvestError> {
        self.cursor.last_completed_item_id = Some(item_id.to_string());
        self.cursor.in_progress_item_id = None;
        self.cursor.resume_at_item_id = None;
        self.save()
    }

    /// Clears the in-flight marker without advancing the resume position
    ///
    /// Used when an item's pagination was aborted: its partial rows stay, but
    /// it is not recorded as complete.
    pub fn abandon(&mut self, item_id: &str) -> Result<(), HarvestError> {
        if self.cursor.in_progress_item_id.as_deref() == Some(item_id) {
            self.cursor.in_progress_item_id = None;
            self.save()?;
        }
        Ok(())
    }

    /// Writes the cursor as it is held in memory
    ///
    /// Startup recovery calls this before it modifies the review store, so
    /// the recovery itself can be interrupted and repeated.
    pub fn persist(&mut self) -> Result<(), HarvestError> {
        self.save()
    }

    /// Clears the in-flight marker after startup recovery dealt with it
    pub fn clear_in_progress(&mut self) -> Result<(), HarvestError> {
        if self.cursor.in_progress_item_id.take().is_some() {
            self.save()?;
        }
        Ok(())
    }

    fn save(&mut self) -> Result<(), HarvestError> {
        self.cursor.updated_at = Some(Utc::now());
        let json = serde_json::to_string_pretty(&self.cursor)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
