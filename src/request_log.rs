//! Append-only record of every request the server has seen.
//!
//! Served back through `GET /api/logs`. Nothing ever clears or trims it.

use parking_lot::Mutex;
use serde::Serialize;

/// Entries returned by `GET /api/logs` when no limit is given.
pub const DEFAULT_LOG_LIMIT: usize = 50;

/// One inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Arrival time, ISO-8601 UTC.
    pub timestamp: String,
    /// HTTP method.
    pub method: String,
    /// Request path without the query string.
    pub path: String,
    /// Client address, or `unknown` when the transport does not expose one.
    pub ip: String,
    /// `User-Agent` header, empty when absent.
    pub user_agent: String,
}

/// Shared request log.
#[derive(Debug, Default)]
pub struct RequestLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl RequestLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, entry: LogEntry) {
        self.entries.lock().push(entry);
    }

    /// The most recent `limit` entries, oldest first.
    pub fn tail(&self, limit: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock();
        let start = entries.len().saturating_sub(limit);
        entries[start..].to_vec()
    }

    /// Total number of entries ever recorded.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
