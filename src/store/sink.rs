//! Append-only CSV sinks
//!
//! A sink is opened once per run and appended to one row at a time. The
//! header is written only when the file is new (or empty), and every row is
//! flushed before `append` returns.

use crate::store::{ListingRecord, ReviewRecord};
use crate::HarvestError;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A row type with a fixed CSV header
pub trait CsvRecord {
    /// Column names, in serialization order
    const HEADER: &'static [&'static str];
}

/// Append-only CSV writer for one record type
pub struct AppendSink<R> {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows_written: u64,
    _record: PhantomData<R>,
}

/// Sink for the movie (item) store
pub type ItemSink = AppendSink<ListingRecord>;

/// Sink for the review store
pub type ReviewSink = AppendSink<ReviewRecord>;

impl<R: CsvRecord + Serialize> AppendSink<R> {
    /// Opens (or creates) the store at `path` for appending
    ///
    /// # Returns
    ///
    /// * `Ok(AppendSink)` - Ready to append; the header is on disk
    /// * `Err(HarvestError)` - The file could not be created or written
    pub fn open(path: &Path) -> Result<Self, HarvestError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let is_new = file.metadata()?.len() == 0;

        if !is_new && !ends_with_newline(&mut file)? {
            tracing::warn!(
                "{} ends in an unterminated row; terminating it before appending",
                path.display()
            );
            file.write_all(b"\n")?;
            file.flush()?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new {
            tracing::debug!("Creating store {}", path.display());
            writer.write_record(R::HEADER)?;
            writer.flush()?;
        }

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            rows_written: 0,
            _record: PhantomData,
        })
    }

    /// Appends one row and flushes it to the file
    pub fn append(&mut self, record: &R) -> Result<(), HarvestError> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    /// Rows appended through this sink since it was opened
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Path of the underlying store
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
