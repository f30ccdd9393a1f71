// SPDX-License-Identifier: MIT

//! Append-only JSONL mirror for the Session Registry. One line per write;
//! on startup the registry replays the file and keeps only the last record
//! per session id (a later `remove` drops any earlier `upsert`).
//!
//! This is a best-effort durability layer, not a WAL: there is no
//! compaction, and a line torn by a crash mid-write is simply skipped on
//! replay.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use wharf_core::{Session, SessionId};

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Record {
    Upsert { session: Session },
    Remove { id: SessionId },
}

pub struct DurableMirror {
    #[allow(dead_code)]
    path: PathBuf,
    file: Mutex<File>,
}

impl DurableMirror {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Replay the mirror file, if it exists, into a flat list of the
    /// sessions that were live at the end of the log.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Vec<Session>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(path)?);
        let mut live: HashMap<SessionId, Session> = HashMap::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = match serde_json::from_str(&line) {
                Ok(record) => record,
                Err(_) => continue,
            };
            match record {
                Record::Upsert { session } => {
                    live.insert(session.id, session);
                }
                Record::Remove { id } => {
                    live.remove(&id);
                }
            }
        }
        Ok(live.into_values().collect())
    }

    pub fn append_upsert(&self, session: &Session) -> io::Result<()> {
        self.append(&Record::Upsert { session: session.clone() })
    }

    pub fn append_remove(&self, id: SessionId) -> io::Result<()> {
        self.append(&Record::Remove { id })
    }

    fn append(&self, record: &Record) -> io::Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = self.file.lock();
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}

#[cfg(test)]
#[path = "durable_tests.rs"]
mod tests;
