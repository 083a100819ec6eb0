//! JSON Lines access log
//!
//! One object per line, appended as events happen:
//!
//! ```text
//! {"timestamp":"2026-10-14T08:15:02.114+00:00","event":"granted","id":7,"confidence":80}
//! {"timestamp":"2026-10-14T08:15:09.530+00:00","event":"rejected","consecutive":1}
//! ```

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::AccessEvent;
use crate::error::{FingerprintError, Result};

/// One log line
#[derive(Debug, Serialize)]
pub struct AccessRecord<'a> {
    /// RFC 3339 UTC time the event was recorded
    pub timestamp: String,

    #[serde(flatten)]
    pub event: &'a AccessEvent,
}

/// Append-only writer for access events
#[derive(Debug)]
pub struct AccessLog {
    path: PathBuf,
    file: File,
}

impl AccessLog {
    /// Open `path` for appending, creating it and its parent directory if needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one event with the current time
    pub fn append(&mut self, event: &AccessEvent) -> Result<()> {
        let record = AccessRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, false),
            event,
        };

        let line = serde_json::to_string(&record)
            .map_err(|e| FingerprintError::Protocol(format!("Failed to encode access record: {}", e)))?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }
}
