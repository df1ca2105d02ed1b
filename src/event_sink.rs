//! JSONL audit sink - best-effort trail of emitted transfer events
//!
//! One JSON array per round batch, one line per append, append-only, never
//! rewritten. Delivery is at-least-once: a round that persisted but crashed
//! before emission is re-emitted on replay. Consumers that need exactly-once
//! records dedup on `(round, sig)`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A normalized transfer, derived from one qualifying transaction.
/// Never persisted in the durable store; only appended here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub round: u64,
    pub sig: String,
    pub sender: i64,
    pub recipient: i64,
    pub amount: i64,
}

#[derive(Debug)]
pub enum SinkError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        SinkError::Io(err)
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        SinkError::Serialization(err)
    }
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Io(e) => write!(f, "IO error: {}", e),
            SinkError::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for SinkError {}

/// Append capability for the audit trail.
#[async_trait]
pub trait EventSink: Send {
    /// Append one round's batch of events.
    async fn append(&mut self, events: &[Event]) -> Result<(), SinkError>;
}

pub struct JsonlEventSink {
    path: PathBuf,
}

impl JsonlEventSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl EventSink for JsonlEventSink {
    async fn append(&mut self, events: &[Event]) -> Result<(), SinkError> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let line = serde_json::to_string(events)?;
        writeln!(file, "{}", line)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_event(round: u64, sig: &str, amount: i64) -> Event {
        Event {
            round,
            sig: sig.to_string(),
            sender: 2,
            recipient: 1,
            amount,
        }
    }

    #[tokio::test]
    async fn test_append_writes_one_line_per_batch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let mut sink = JsonlEventSink::new(&path);

        sink.append(&[make_event(1, "sig_a", 1000)]).await.unwrap();
        sink.append(&[make_event(2, "sig_b", 100), make_event(2, "sig_c", 50)])
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Vec<Event> = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, vec![make_event(1, "sig_a", 1000)]);

        let second: Vec<Event> = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second[1].sig, "sig_c");
    }

    #[tokio::test]
    async fn test_append_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/streams/events.jsonl");
        let mut sink = JsonlEventSink::new(&path);

        sink.append(&[make_event(1, "sig", 10)]).await.unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_event_serializes_expected_fields() {
        let json = serde_json::to_string(&make_event(4, "xyz", 77)).unwrap();
        assert_eq!(
            json,
            r#"{"round":4,"sig":"xyz","sender":2,"recipient":1,"amount":77}"#
        );
    }
}
