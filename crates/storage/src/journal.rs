// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only store journal.
//!
//! One [`StoreEvent`] per line, serialized as JSON. The journal is the
//! durable form of the store; the tables are rebuilt from it on open. It
//! stays uncompressed so a debugging session's history can be inspected
//! with ordinary text tools.

use crate::StoreError;
use ms_core::StoreEvent;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, Write};
use std::path::{Path, PathBuf};

const JOURNAL_FILE: &str = "journal.log";

pub struct Journal {
    path: PathBuf,
    file: File,
}

impl Journal {
    /// Open (creating if needed) the journal under `dir` and replay its
    /// events. A line that does not parse refuses the whole journal: a
    /// torn log must not silently drop coordination history.
    pub fn open(dir: &Path) -> Result<(Self, Vec<StoreEvent>), StoreError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(JOURNAL_FILE);
        let mut events = Vec::new();
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for (idx, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let event = serde_json::from_str(&line)
                    .map_err(|_| StoreError::CorruptJournal { line: idx + 1 })?;
                events.push(event);
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok((Self { path, file }, events))
    }

    /// Append one event and flush it to disk.
    pub fn append(&mut self, event: &StoreEvent) -> Result<(), StoreError> {
        let line = serde_json::to_string(event)
            .map_err(|e| StoreError::Integrity(format!("unserializable event: {e}")))?;
        writeln!(self.file, "{line}")?;
        self.file.flush()?;
        Ok(())
    }

    /// Truncate the journal.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.file = OpenOptions::new().write(true).truncate(true).open(&self.path)?;
        self.file.seek(std::io::SeekFrom::Start(0))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
