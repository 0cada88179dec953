//! Append-only JSONL sink, partitioned by UTC date and record kind.
//!
//! Write-behind side channel for deployments that want a durable trace of
//! everything the relay accepted. Each record is one line of
//! `{"timestamp": …, "data": …}` in `<dir>/<kind>_<YYYY-MM-DD>.jsonl`.
//! Ingestion never depends on the sink: callers log a failed write and move
//! on.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use serde_json::json;
use thiserror::Error;

use crate::envelope::Envelope;

#[derive(Debug, Error)]
pub enum SinkError {
    /// Kind tags become file names; anything beyond `[a-z0-9_-]` is refused.
    #[error("invalid record kind: {0:?}")]
    InvalidKind(String),

    /// No log file exists for the requested kind and day.
    #[error("no log for {kind} on {date}")]
    NotFound { kind: String, date: NaiveDate },

    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt sink record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Date-partitioned JSONL writer/reader rooted at one directory.
pub struct JsonlSink {
    dir: PathBuf,
}

impl JsonlSink {
    /// Opens a sink rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Appends one envelope to today's partition for `kind`.
    pub fn record(&self, kind: &str, envelope: &Envelope) -> Result<(), SinkError> {
        validate_kind(kind)?;
        let line = json!({
            "timestamp": envelope.timestamp,
            "data": envelope.payload.to_value(),
        });
        let path = self.partition_path(kind, envelope.timestamp.date_naive());
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Reads back every record of one day's partition.
    pub fn read_day(&self, kind: &str, date: NaiveDate) -> Result<Vec<serde_json::Value>, SinkError> {
        validate_kind(kind)?;
        let path = self.partition_path(kind, date);
        if !path.exists() {
            return Err(SinkError::NotFound {
                kind: kind.to_string(),
                date,
            });
        }
        let reader = BufReader::new(fs::File::open(path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }
        Ok(entries)
    }

    fn partition_path(&self, kind: &str, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}_{}.jsonl", kind, date.format("%Y-%m-%d")))
    }
}

/// Today's partition date, for callers resolving a default query.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn validate_kind(kind: &str) -> Result<(), SinkError> {
    let ok = !kind.is_empty()
        && kind
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(SinkError::InvalidKind(kind.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Payload, Source, Transport};
    use serde_json::json;

    fn envelope(value: serde_json::Value) -> Envelope {
        Envelope::now(
            Source::new(Transport::Http, "10.0.0.2:40000".parse().unwrap()),
            Payload::Structured(value),
        )
    }

    #[test]
    fn records_and_reads_back_one_day() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlSink::open(dir.path()).unwrap();

        sink.record("sensor", &envelope(json!({"soc": 91}))).unwrap();
        sink.record("sensor", &envelope(json!({"soc": 90}))).unwrap();

        let entries = sink.read_day("sensor", today()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["data"]["soc"], 91);
        assert_eq!(entries[1]["data"]["soc"], 90);
        assert!(entries[0]["timestamp"].is_string());
    }

    #[test]
    fn raw_payloads_become_json_strings() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlSink::open(dir.path()).unwrap();
        let raw = Envelope::now(
            Source::new(Transport::Tcp, "10.0.0.2:40001".parse().unwrap()),
            Payload::Raw("V=51.2".into()),
        );
        sink.record("sensor", &raw).unwrap();

        let entries = sink.read_day("sensor", today()).unwrap();
        assert_eq!(entries[0]["data"], "V=51.2");
    }

    #[test]
    fn missing_partition_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlSink::open(dir.path()).unwrap();
        let err = sink
            .read_day("sensor", "2026-01-01".parse().unwrap())
            .unwrap_err();
        assert!(matches!(err, SinkError::NotFound { .. }));
    }

    #[test]
    fn refuses_path_escaping_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlSink::open(dir.path()).unwrap();
        let err = sink.record("../etc/passwd", &envelope(json!(1))).unwrap_err();
        assert!(matches!(err, SinkError::InvalidKind(_)));
    }
}
