//! Log writer module
//!
//! Thread-safe appending log file that is archived once it grows past a size
//! limit. Plugs into `tracing-subscriber` as a [`MakeWriter`].

use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// Size-limited log file shared by every writer handle
#[derive(Debug, Clone)]
pub struct RotatingFileWriter {
    inner: Arc<Mutex<LogFile>>,
}

#[derive(Debug)]
struct LogFile {
    path: PathBuf,
    max_bytes: u64,
    file: File,
    written: u64,
}

impl RotatingFileWriter {
    /// Open (or create) `path` for appending
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64) -> io::Result<Self> {
        let path = path.into();
        let file = open_log_file(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            inner: Arc::new(Mutex::new(LogFile {
                path,
                max_bytes,
                file,
                written,
            })),
        })
    }
}

impl LogFile {
    /// Archive the current file if it is over the limit and start a new one
    fn rotate_if_needed(&mut self) -> io::Result<()> {
        if self.written <= self.max_bytes {
            return Ok(());
        }
        let archived = archive_name(&self.path, &Local::now().format("%d-%m-%y_%H-%M-%S").to_string());
        self.file.flush()?;
        std::fs::rename(&self.path, &archived)?;
        self.file = open_log_file(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

/// `<stem>_ending_at_<stamp><.ext>` next to the original file
fn archive_name(path: &Path, stamp: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    path.with_file_name(format!("{stem}_ending_at_{stamp}{extension}"))
}

/// Open or create a log file for appending
fn open_log_file(path: &Path) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

fn poisoned() -> io::Error {
    io::Error::other("log file lock poisoned")
}

/// Handle returned to `tracing-subscriber` for each event
pub struct LogFileHandle {
    inner: Arc<Mutex<LogFile>>,
}

impl Write for LogFileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut log = self.inner.lock().map_err(|_| poisoned())?;
        log.rotate_if_needed()?;
        let n = log.file.write(buf)?;
        log.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut log = self.inner.lock().map_err(|_| poisoned())?;
        log.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = LogFileHandle;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}
