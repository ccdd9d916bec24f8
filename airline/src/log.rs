//! Ring-buffered coordination log, capped at [`LOG_CAPACITY`] entries.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Maximum number of [`LogEntry`] values retained; oldest is evicted FIFO.
pub const LOG_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Kind {
    Message,
    Transaction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Pending,
    Commited,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub kind: Kind,
    pub status: Status,
    pub payload: String,
}

/// A FIFO ring buffer of [`LogEntry`] values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogRing(VecDeque<LogEntry>);

impl LogRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        if self.0.len() >= LOG_CAPACITY {
            self.0.pop_front();
        }
        self.0.push_back(entry);
    }

    pub fn record(&mut self, kind: Kind, status: Status, payload: impl Into<String>) {
        self.push(LogEntry {
            timestamp: chrono::Utc::now(),
            kind,
            status,
            payload: payload.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_once_at_capacity() {
        let mut ring = LogRing::new();
        for i in 0..LOG_CAPACITY + 10 {
            ring.record(Kind::Message, Status::Commited, i.to_string());
        }
        assert_eq!(ring.len(), LOG_CAPACITY);
        assert_eq!(ring.iter().next().unwrap().payload, "10");
    }
}
