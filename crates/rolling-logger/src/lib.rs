//! Rolling Logger
//!
//! File logger with a bounded set of rotated files.
//! `log` records are bridged into `tracing` so library code can keep using
//! the `log` facade while the application owns the subscriber.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Default size of a single log file before it is rotated (2 MiB)
pub const DEFAULT_MAX_BYTES: u64 = 2 * 1024 * 1024;
/// Default number of rotated files kept next to the active one
pub const DEFAULT_MAX_FILES: usize = 5;

static INITIALIZED: OnceLock<PathBuf> = OnceLock::new();

/// Logger errors
#[derive(Debug)]
pub enum LoggerError {
    Io(io::Error),
    AlreadyInitialized,
    NotInitialized,
    Subscriber(String),
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerError::Io(e) => write!(f, "log file error: {}", e),
            LoggerError::AlreadyInitialized => write!(f, "logger already initialized"),
            LoggerError::NotInitialized => write!(f, "logger not initialized"),
            LoggerError::Subscriber(msg) => write!(f, "failed to install subscriber: {}", msg),
        }
    }
}

impl std::error::Error for LoggerError {}

impl From<io::Error> for LoggerError {
    fn from(e: io::Error) -> Self {
        LoggerError::Io(e)
    }
}

/// Logger options
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub dir: PathBuf,
    pub app_name: String,
    pub max_bytes: u64,
    pub max_files: usize,
    /// Filter used when `RUST_LOG` is not set
    pub default_filter: String,
}

impl LoggerOptions {
    pub fn new(dir: impl Into<PathBuf>, app_name: &str) -> Self {
        Self {
            dir: dir.into(),
            app_name: app_name.to_string(),
            max_bytes: DEFAULT_MAX_BYTES,
            max_files: DEFAULT_MAX_FILES,
            default_filter: "info".to_string(),
        }
    }
}

/// A log file that rotates itself once it grows past `max_bytes`.
///
/// Rotated files are named `<app>.log.1` (newest) up to `<app>.log.<max_files>`
/// (oldest); anything older is removed.
pub struct RollingFile {
    dir: PathBuf,
    app_name: String,
    max_bytes: u64,
    max_files: usize,
    file: File,
    written: u64,
}

impl RollingFile {
    pub fn open(dir: &Path, app_name: &str, max_bytes: u64, max_files: usize) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = active_path(dir, app_name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            dir: dir.to_path_buf(),
            app_name: app_name.to_string(),
            max_bytes: max_bytes.max(1),
            max_files,
            file,
            written,
        })
    }

    /// Path of the file currently written to
    pub fn path(&self) -> PathBuf {
        active_path(&self.dir, &self.app_name)
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.app_name, index))
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.max_files == 0 {
            // No history kept: truncate in place
            self.file = File::create(self.path())?;
            self.written = 0;
            return Ok(());
        }

        let oldest = self.rotated_path(self.max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.max_files).rev() {
            let from = self.rotated_path(index);
            if from.exists() {
                fs::rename(&from, self.rotated_path(index + 1))?;
            }
        }
        fs::rename(self.path(), self.rotated_path(1))?;

        self.file = OpenOptions::new().create(true).append(true).open(self.path())?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn active_path(dir: &Path, app_name: &str) -> PathBuf {
    dir.join(format!("{}.log", app_name))
}

/// Shared handle handed to `tracing-subscriber`
struct RollingWriter {
    inner: Mutex<RollingFile>,
}

struct RollingWriterGuard<'a> {
    guard: MutexGuard<'a, RollingFile>,
}

impl Write for RollingWriterGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.guard.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingWriter {
    type Writer = RollingWriterGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        let guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        RollingWriterGuard { guard }
    }
}

struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Initialize the global logger writing to `<dir>/<app_name>.log`
pub fn init_logger(dir: impl Into<PathBuf>, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with(LoggerOptions::new(dir, app_name))
}

/// Initialize the global logger with explicit rotation settings
pub fn init_logger_with(options: LoggerOptions) -> Result<(), LoggerError> {
    if INITIALIZED.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let file = RollingFile::open(&options.dir, &options.app_name, options.max_bytes, options.max_files)?;
    let log_path = file.path();
    let writer = RollingWriter {
        inner: Mutex::new(file),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_timer(LocalTime)
        .with_ansi(false)
        .try_init()
        .map_err(|e| LoggerError::Subscriber(e.to_string()))?;

    INITIALIZED
        .set(log_path.clone())
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    log::info!("Logger initialized at {}", log_path.display());
    Ok(())
}

/// Path of the active log file, once initialized
pub fn log_file_path() -> Option<&'static Path> {
    INITIALIZED.get().map(PathBuf::as_path)
}

/// Log an info message through the installed logger
pub fn info(message: &str) -> Result<(), LoggerError> {
    if INITIALIZED.get().is_none() {
        return Err(LoggerError::NotInitialized);
    }
    tracing::info!("{}", message);
    Ok(())
}

/// Log an error message through the installed logger
pub fn error(message: &str) -> Result<(), LoggerError> {
    if INITIALIZED.get().is_none() {
        return Err(LoggerError::NotInitialized);
    }
    tracing::error!("{}", message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_append_to_active_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "app", 1024, 3).unwrap();

        file.write_all(b"first line\n").unwrap();
        file.write_all(b"second line\n").unwrap();
        file.flush().unwrap();

        let content = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert_eq!(content, "first line\nsecond line\n");
        assert!(!dir.path().join("app.log.1").exists());
    }

    #[test]
    fn test_rotates_when_size_exceeded() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "app", 10, 2).unwrap();

        file.write_all(b"aaaaaaaa\n").unwrap();
        file.write_all(b"bbbbbbbb\n").unwrap();
        file.write_all(b"cccccccc\n").unwrap();
        file.flush().unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("app.log")).unwrap(), "cccccccc\n");
        assert_eq!(fs::read_to_string(dir.path().join("app.log.1")).unwrap(), "bbbbbbbb\n");
        assert_eq!(fs::read_to_string(dir.path().join("app.log.2")).unwrap(), "aaaaaaaa\n");
    }

    #[test]
    fn test_oldest_file_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "app", 4, 2).unwrap();

        for line in ["1111\n", "2222\n", "3333\n", "4444\n"] {
            file.write_all(line.as_bytes()).unwrap();
        }
        file.flush().unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("app.log")).unwrap(), "4444\n");
        assert_eq!(fs::read_to_string(dir.path().join("app.log.1")).unwrap(), "3333\n");
        assert_eq!(fs::read_to_string(dir.path().join("app.log.2")).unwrap(), "2222\n");
        assert!(!dir.path().join("app.log.3").exists());
    }

    #[test]
    fn test_reopen_continues_size_accounting() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut file = RollingFile::open(dir.path(), "app", 12, 1).unwrap();
            file.write_all(b"0123456789\n").unwrap();
        }
        let mut file = RollingFile::open(dir.path(), "app", 12, 1).unwrap();
        file.write_all(b"next\n").unwrap();
        file.flush().unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("app.log")).unwrap(), "next\n");
        assert_eq!(fs::read_to_string(dir.path().join("app.log.1")).unwrap(), "0123456789\n");
    }

    #[test]
    fn test_helpers_require_init() {
        assert!(matches!(info("hello"), Err(LoggerError::NotInitialized)));
        assert!(matches!(error("boom"), Err(LoggerError::NotInitialized)));
        assert!(log_file_path().is_none());
    }
}
