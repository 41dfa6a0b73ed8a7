// crates/launchpad-store/src/log.rs
// ============================================================================
// Module: Update Logs
// Description: Append-only JSON-line and plain-text update logs.
// Purpose: Record every bootstrap transition for diagnostics.
// Dependencies: launchpad-core, serde_json
// ============================================================================

//! ## Overview
//! [`FileUpdateLog`] appends one JSON object per line, each written with a
//! single `write_all` and flushed, so concurrent tailers only ever see whole
//! lines plus at most one partial trailing line. [`DiagnosticLog`] renders the
//! same entries as human-readable text. [`CompositeLog`] fans one entry out
//! to several logs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use launchpad_core::LogEntry;
use launchpad_core::LogError;
use launchpad_core::UpdateLog;

// ============================================================================
// SECTION: Append-Only File
// ============================================================================

/// Opens `path` for appending, creating it and its parent when missing.
fn open_append(path: &Path) -> Result<File, LogError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| LogError::Io(err.to_string()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| LogError::Io(format!("open {}: {err}", path.display())))
}

/// Writes one complete line and flushes it.
fn append_line(file: &Mutex<File>, line: &[u8]) -> Result<(), LogError> {
    let mut file = file.lock().map_err(|_| LogError::Io("log mutex poisoned".to_string()))?;
    file.write_all(line).map_err(|err| LogError::Io(err.to_string()))?;
    file.flush().map_err(|err| LogError::Io(err.to_string()))
}

// ============================================================================
// SECTION: JSON Lines Log
// ============================================================================

/// Structured update log stored as JSON lines.
#[derive(Debug)]
pub struct FileUpdateLog {
    /// Log file path.
    path: PathBuf,
    /// Open append-mode handle.
    file: Mutex<File>,
}

impl FileUpdateLog {
    /// Opens or creates the log at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] when the file cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();
        let file = open_append(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Returns the log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UpdateLog for FileUpdateLog {
    fn append(&self, entry: &LogEntry) -> Result<(), LogError> {
        let mut line =
            serde_json::to_vec(entry).map_err(|err| LogError::Encode(err.to_string()))?;
        line.push(b'\n');
        append_line(&self.file, &line)
    }
}

/// Reads every complete entry from a JSON-line log.
///
/// A trailing line without a newline is an append in progress and is
/// skipped, as are lines that do not decode.
///
/// # Errors
///
/// Returns [`LogError::Io`] when the file exists but cannot be read.
pub fn read_log(path: &Path) -> Result<Vec<LogEntry>, LogError> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(LogError::Io(format!("read {}: {err}", path.display()))),
    };
    let complete = match content.iter().rposition(|byte| *byte == b'\n') {
        Some(end) => &content[..= end],
        None => return Ok(Vec::new()),
    };
    Ok(complete
        .split(|byte| *byte == b'\n')
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_slice(line).ok())
        .collect())
}

// ============================================================================
// SECTION: Diagnostic Log
// ============================================================================

/// Plain-text diagnostic log for support requests.
#[derive(Debug)]
pub struct DiagnosticLog {
    /// Log file path.
    path: PathBuf,
    /// Open append-mode handle.
    file: Mutex<File>,
}

impl DiagnosticLog {
    /// Opens or creates the log at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] when the file cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();
        let file = open_append(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Returns the log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Renders one entry as a diagnostic line.
fn render_line(entry: &LogEntry) -> String {
    let error = entry.error.map(|kind| format!(" [{}]", kind.as_str())).unwrap_or_default();
    let detail = entry.detail.replace(['\r', '\n'], " ");
    format!(
        "[{}] {} {}{error}: {detail}\n",
        entry.timestamp,
        entry.phase.as_str(),
        entry.outcome.as_str()
    )
}

impl UpdateLog for DiagnosticLog {
    fn append(&self, entry: &LogEntry) -> Result<(), LogError> {
        append_line(&self.file, render_line(entry).as_bytes())
    }
}

// ============================================================================
// SECTION: Composite Log
// ============================================================================

/// Update log that forwards every entry to several logs.
#[derive(Clone, Default)]
pub struct CompositeLog {
    /// Target logs, in write order.
    sinks: Vec<Arc<dyn UpdateLog>>,
}

impl CompositeLog {
    /// Creates a composite over `sinks`.
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn UpdateLog>>) -> Self {
        Self {
            sinks,
        }
    }
}

impl UpdateLog for CompositeLog {
    /// Writes to every sink, returning the first failure after all attempts.
    fn append(&self, entry: &LogEntry) -> Result<(), LogError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(err) = sink.append(entry) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
