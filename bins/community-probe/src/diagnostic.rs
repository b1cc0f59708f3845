//! Diagnostic log sinks
//!
//! The probe writes its trace through a [`DiagnosticSink`] handed to it by
//! the caller. [`FileLog`] persists to disk and mirrors to stdout;
//! [`MemoryLog`] keeps lines in memory for tests.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default log file name, relative to the working directory
pub const DEFAULT_LOG_FILE: &str = "debug_output.txt";

/// Destination for diagnostic trace lines
pub trait DiagnosticSink {
    /// Append one event to the log
    ///
    /// A message may itself span several lines (JSON dumps); it is still a
    /// single event.
    fn line(&mut self, message: &str);
}

/// Append-only log file, truncated when opened
pub struct FileLog {
    file: File,
    path: PathBuf,
    mirror: bool,
    write_failed: bool,
}

impl FileLog {
    /// Create or truncate `path` and write `header` as the first line
    ///
    /// The header is written to the file only; later lines are mirrored to
    /// stdout as well.
    pub fn create(path: impl AsRef<Path>, header: &str) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::create(&path)?;
        writeln!(file, "{header}")?;

        Ok(Self {
            file,
            path,
            mirror: true,
            write_failed: false,
        })
    }

    /// Enable or disable mirroring to stdout
    #[must_use]
    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DiagnosticSink for FileLog {
    fn line(&mut self, message: &str) {
        if let Err(e) = writeln!(self.file, "{message}") {
            // Keep going: stdout still carries the trace.
            if !self.write_failed {
                warn!(path = %self.path.display(), error = %e, "Failed to write diagnostic log");
                self.write_failed = true;
            }
        }

        if self.mirror {
            println!("{message}");
        }
    }
}

/// In-memory sink
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Vec<String>,
}

#[cfg(test)]
impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event logged so far
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Last event logged
    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    /// Whether any event contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }

    /// The log as it would appear on disk
    pub fn contents(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
impl DiagnosticSink for MemoryLog {
    fn line(&mut self, message: &str) {
        self.lines.push(message.to_string());
    }
}
