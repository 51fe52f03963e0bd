//! Persistence sink
//!
//! A [`Recorder`] snapshots the store on the caller's schedule and appends
//! one [`PersistedRecord`] to a [`RecordSink`]. Persistence is best effort:
//! a failing sink is reported to the caller and never reaches the decode
//! path or the store.

use crate::channel::Channel;
use crate::store::SensorStore;
use crate::types::{DecoderError, Result, Timestamp};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Timestamp layout of persisted records
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One appended row: id, wall-clock time and the selected channel values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    /// Auto-increment row id, starting at 1
    pub id: u64,
    /// Local time, "YYYY-MM-DD HH:MM:SS"
    pub timestamp: String,
    /// Column name -> value, `None` when the channel has no value yet
    pub values: BTreeMap<String, Option<f64>>,
}

impl PersistedRecord {
    /// Build a record from a store snapshot
    pub fn capture(id: u64, at: Timestamp, store: &SensorStore, channels: &[Channel]) -> Self {
        let snapshot = store.snapshot();
        let values = channels
            .iter()
            .map(|&channel| (channel.column().to_string(), snapshot.latest(channel)))
            .collect();

        Self {
            id,
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            values,
        }
    }

    /// Value of a channel column
    pub fn value(&self, channel: Channel) -> Option<f64> {
        self.values.get(channel.column()).copied().flatten()
    }
}

/// Append-only destination for persisted records
pub trait RecordSink: Send {
    /// Append one record
    fn append(&mut self, record: &PersistedRecord) -> Result<()>;

    /// Id of the last record already stored (0 if empty)
    fn last_id(&self) -> u64 {
        0
    }
}

/// JSON Lines file sink, one record per line
pub struct JsonLinesSink {
    path: PathBuf,
    file: File,
    last_id: u64,
    /// The file ends in a partial line that must be terminated first
    needs_newline: bool,
}

impl JsonLinesSink {
    /// Open (or create) a JSON Lines log
    ///
    /// Existing rows are kept; the id sequence continues after the last one.
    /// Lines that do not parse, such as a write torn by power loss, are
    /// skipped with a warning. A partial last line is closed off before the
    /// next record so that record starts on a line of its own.
    pub fn open(path: &Path) -> Result<Self> {
        let (last_id, needs_newline) = if path.exists() {
            Self::scan_existing(path)?
        } else {
            (0, false)
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| DecoderError::PersistenceError(format!("cannot open {:?}: {}", path, e)))?;

        log::info!("Persisting records to {:?} (last id {})", path, last_id);
        Ok(Self {
            path: path.to_path_buf(),
            file,
            last_id,
            needs_newline,
        })
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Highest stored id and whether the file lacks a trailing newline
    fn scan_existing(path: &Path) -> Result<(u64, bool)> {
        #[derive(Deserialize)]
        struct IdOnly {
            id: u64,
        }

        let content = std::fs::read(path)?;
        let needs_newline = content.last().is_some_and(|&b| b != b'\n');

        let mut last_id = 0;
        for (index, line) in content.split(|&b| b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<IdOnly>(line) {
                Ok(row) => last_id = last_id.max(row.id),
                Err(e) => log::warn!("Skipping unreadable line {} of {:?}: {}", index + 1, path, e),
            }
        }
        Ok((last_id, needs_newline))
    }
}

impl RecordSink for JsonLinesSink {
    fn append(&mut self, record: &PersistedRecord) -> Result<()> {
        let mut line = if self.needs_newline { "\n".to_string() } else { String::new() };
        line.push_str(&serde_json::to_string(record)?);
        line.push('\n');
        self.file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(|e| DecoderError::PersistenceError(format!("write to {:?} failed: {}", self.path, e)))?;
        self.last_id = record.id;
        self.needs_newline = false;
        Ok(())
    }

    fn last_id(&self) -> u64 {
        self.last_id
    }
}

/// In-memory sink
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<PersistedRecord>,
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: &PersistedRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn last_id(&self) -> u64 {
        self.records.last().map(|r| r.id).unwrap_or(0)
    }
}

/// Periodic store-to-sink writer
pub struct Recorder {
    sink: Box<dyn RecordSink>,
    channels: Vec<Channel>,
    next_id: u64,
    failures: u64,
}

impl Recorder {
    /// Record every channel
    pub fn new(sink: Box<dyn RecordSink>) -> Self {
        Self::with_channels(sink, Channel::ALL.to_vec())
    }

    /// Record only the given channels (all channels if empty)
    pub fn with_channels(sink: Box<dyn RecordSink>, channels: Vec<Channel>) -> Self {
        let channels = if channels.is_empty() {
            Channel::ALL.to_vec()
        } else {
            channels
        };
        let next_id = sink.last_id() + 1;
        Self {
            sink,
            channels,
            next_id,
            failures: 0,
        }
    }

    /// Append one record with the current store contents
    ///
    /// Returns the id written. On failure the id is not consumed.
    pub fn record(&mut self, store: &SensorStore) -> Result<u64> {
        self.record_at(store, Local::now())
    }

    /// Append one record stamped with a given time
    pub fn record_at(&mut self, store: &SensorStore, at: Timestamp) -> Result<u64> {
        let record = PersistedRecord::capture(self.next_id, at, store, &self.channels);
        match self.sink.append(&record) {
            Ok(()) => {
                self.next_id += 1;
                Ok(record.id)
            }
            Err(e) => {
                self.failures += 1;
                Err(e)
            }
        }
    }

    /// Number of failed appends so far
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Channels included in each record
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }
}
