//! Append-only CSV log of benchmark records.
//!
//! Each [`ResultSink`] owns exactly one file, named after a tag and the
//! creation time. Rows are appended one at a time and the file is closed after
//! every write, so a crash mid-run leaves all earlier rows readable.

use crate::record::BenchmarkRecord;
use chrono::Local;
use std::{
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Timestamp format used in log file names.
const FILE_TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H%M%S";

/// Upper bound on `_<n>` suffixes tried when the timestamped name is taken.
const MAX_NAME_SUFFIX: u32 = 1000;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Cannot create log directory {path:?}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("Cannot create log file {path:?}: {source}")]
    CreateFile { path: PathBuf, source: io::Error },
    #[error("I/O error on log file: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes [`BenchmarkRecord`]s to a uniquely named CSV file.
#[derive(Debug)]
pub struct ResultSink {
    log_file: PathBuf,
}

impl ResultSink {
    /// Creates `dir` if needed and reserves a new log file named
    /// `<tag>_<YYYY_MM_DD_HHMMSS>.csv` inside it.
    ///
    /// An empty `dir` means the current directory. If a file with that name
    /// already exists, `_1`, `_2`, ... is appended to the stem.
    pub fn new(tag: &str, dir: impl AsRef<Path>) -> Result<Self, SinkError> {
        let dir = dir.as_ref();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|source| SinkError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let stem = format!("{tag}_{}", Local::now().format(FILE_TIMESTAMP_FORMAT));
        let log_file = reserve_file(dir, &stem)?;
        log::debug!("Reserved log file {:?}", log_file);
        Ok(Self { log_file })
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Appends one row, preceded by the header if the file is still empty.
    pub fn write_row(&self, record: &BenchmarkRecord) -> Result<(), SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;
        let is_empty = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_empty)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    /// Deletes the log file if no row was ever written to it.
    ///
    /// Returns whether the file was removed.
    pub fn remove_if_empty(self) -> Result<bool, SinkError> {
        if fs::metadata(&self.log_file)?.len() == 0 {
            fs::remove_file(&self.log_file)?;
            return Ok(true);
        }
        Ok(false)
    }
}

/// Atomically creates the first free `<stem>[_n].csv` in `dir`.
fn reserve_file(dir: &Path, stem: &str) -> Result<PathBuf, SinkError> {
    let mut attempt = 0;
    loop {
        let name = if attempt == 0 {
            format!("{stem}.csv")
        } else {
            format!("{stem}_{attempt}.csv")
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => return Ok(path),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < MAX_NAME_SUFFIX => {
                attempt += 1;
            }
            Err(source) => return Err(SinkError::CreateFile { path, source }),
        }
    }
}

/// Counts the lines of a log file, header included.
pub fn count_lines(path: impl AsRef<Path>) -> io::Result<usize> {
    let text = fs::read_to_string(path)?;
    Ok(text.lines().count())
}
