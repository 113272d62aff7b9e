//! In-memory inventory store and the record type it holds.
//!
//! Records are free-form JSON objects. The store only ever appends or clears; nothing mutates a
//! record after insertion, and a record's identity is its position in insertion order.

mod query;
mod stats;

pub use query::{InventoryQuery, filter_records, last_param, parse_limit, take_last};
pub use stats::{InventoryStats, compute_stats};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Well-known record field names.
pub mod fields {
    /// Upstream scan timestamp.
    pub const TIMESTAMP: &str = "timestamp";
    /// Site label.
    pub const SITE: &str = "site";
    /// Floor label.
    pub const FLOOR: &str = "floor";
    /// Room label.
    pub const ROOM: &str = "room";
    /// Shelf label.
    pub const SHELF: &str = "shelf";
    /// Scanned product barcode.
    pub const PRODUCT_BARCODE: &str = "productBarcode";
    /// Scanned quantity.
    pub const QUANTITY: &str = "quantity";
    /// Ingestion timestamp stamped by the server.
    pub const RECEIVED_AT: &str = "receivedAt";
    /// Origin label stamped by the server.
    pub const SOURCE: &str = "source";
}

/// Origin label used when an ingest request names none.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// One inventory scan entry. Serializes as the bare JSON object it wraps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryRecord(Map<String, Value>);

impl InventoryRecord {
    /// Wrap upstream fields and stamp them with the ingestion time and origin label.
    ///
    /// Any `receivedAt` or `source` supplied by the client is overwritten.
    pub fn stamped(mut fields: Map<String, Value>, received_at: &str, source: &str) -> Self {
        fields.insert(
            fields::RECEIVED_AT.to_string(),
            Value::String(received_at.to_string()),
        );
        fields.insert(fields::SOURCE.to_string(), Value::String(source.to_string()));
        Self(fields)
    }

    /// Raw field value, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Field rendered as text, or `None` when missing, null, or an empty string.
    ///
    /// Strings come back verbatim; numbers and booleans use their JSON spelling.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(value) if value.is_empty() => None,
            Value::String(value) => Some(value.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Exact, case-sensitive comparison of a field against a query value.
    pub fn field_equals(&self, key: &str, expected: &str) -> bool {
        match self.0.get(key) {
            Some(Value::String(value)) => value == expected,
            Some(Value::Number(value)) => value.to_string() == expected,
            Some(Value::Bool(value)) => value.to_string() == expected,
            _ => false,
        }
    }

    /// Ingestion timestamp stamped by [`InventoryRecord::stamped`].
    pub fn received_at(&self) -> Option<&str> {
        self.0.get(fields::RECEIVED_AT).and_then(Value::as_str)
    }

    /// All fields in insertion order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Errors raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend could not serve the operation.
    #[error("inventory store unavailable: {0}")]
    Unavailable(String),
}

/// Result of an append, captured under the same lock as the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Position of the first appended record.
    pub first_position: usize,
    /// Number of records appended.
    pub added: usize,
    /// Store length after the append.
    pub total: usize,
}

/// Mutation and read surface shared by the HTTP handlers.
///
/// Implementations must keep insertion order and must append a batch atomically.
pub trait InventoryStore: Send + Sync {
    /// Append one record.
    fn append(&self, record: InventoryRecord) -> Result<AppendOutcome, StoreError> {
        self.append_batch(vec![record])
    }

    /// Append records in order as one unit.
    fn append_batch(&self, records: Vec<InventoryRecord>) -> Result<AppendOutcome, StoreError>;

    /// Copy of every record in insertion order.
    fn snapshot(&self) -> Result<Vec<InventoryRecord>, StoreError>;

    /// Number of stored records.
    fn len(&self) -> Result<usize, StoreError>;

    /// Whether the store holds no records.
    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Drop every record, returning how many were removed.
    fn clear(&self) -> Result<usize, StoreError>;
}

/// Process-local store backed by a vector. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    records: RwLock<Vec<InventoryRecord>>,
}

impl MemoryInventory {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl InventoryStore for MemoryInventory {
    fn append_batch(&self, records: Vec<InventoryRecord>) -> Result<AppendOutcome, StoreError> {
        let mut guard = self.records.write();
        let first_position = guard.len();
        let added = records.len();
        guard.extend(records);
        Ok(AppendOutcome {
            first_position,
            added,
            total: guard.len(),
        })
    }

    fn snapshot(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        Ok(self.records.read().clone())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().len())
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let mut guard = self.records.write();
        let removed = guard.len();
        guard.clear();
        Ok(removed)
    }
}

#[cfg(test)]
pub(crate) fn record_from(value: Value) -> InventoryRecord {
    match value {
        Value::Object(map) => InventoryRecord(map),
        other => panic!("expected object, got {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn fields_of(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn stamping_overwrites_client_metadata() {
        let record = InventoryRecord::stamped(
            fields_of(json!({"productBarcode": "123", "source": "spoofed", "receivedAt": "old"})),
            "2026-01-01T00:00:00.000Z",
            "scanner-7",
        );
        assert_eq!(record.received_at(), Some("2026-01-01T00:00:00.000Z"));
        assert_eq!(record.text("source").as_deref(), Some("scanner-7"));
        assert_eq!(record.text("productBarcode").as_deref(), Some("123"));
    }

    #[test]
    fn text_skips_null_and_empty_values() {
        let record = record_from(json!({"site": "", "floor": null, "room": 4, "shelf": "B2"}));
        assert_eq!(record.text("site"), None);
        assert_eq!(record.text("floor"), None);
        assert_eq!(record.text("missing"), None);
        assert_eq!(record.text("room").as_deref(), Some("4"));
        assert_eq!(record.text("shelf").as_deref(), Some("B2"));
    }

    #[test]
    fn field_equality_is_exact_and_case_sensitive() {
        let record = record_from(json!({"site": "North", "floor": 2}));
        assert!(record.field_equals("site", "North"));
        assert!(!record.field_equals("site", "north"));
        assert!(!record.field_equals("site", "Nort"));
        assert!(record.field_equals("floor", "2"));
        assert!(!record.field_equals("room", ""));
    }

    #[test]
    fn append_reports_position_and_total() {
        let store = MemoryInventory::new();
        let first = store.append(record_from(json!({"n": 1}))).expect("append");
        let second = store.append(record_from(json!({"n": 2}))).expect("append");
        assert_eq!(first.first_position, 0);
        assert_eq!(first.total, 1);
        assert_eq!(second.first_position, 1);
        assert_eq!(second.total, 2);
        assert_eq!(store.len().expect("len"), 2);
    }

    #[test]
    fn batch_preserves_order_and_clear_empties() {
        let store = MemoryInventory::new();
        store.append(record_from(json!({"n": 0}))).expect("append");
        let outcome = store
            .append_batch(vec![
                record_from(json!({"n": 1})),
                record_from(json!({"n": 2})),
            ])
            .expect("batch");
        assert_eq!(outcome.first_position, 1);
        assert_eq!(outcome.added, 2);
        assert_eq!(outcome.total, 3);

        let order: Vec<_> = store
            .snapshot()
            .expect("snapshot")
            .iter()
            .map(|record| record.get("n").cloned())
            .collect();
        assert_eq!(order, vec![Some(json!(0)), Some(json!(1)), Some(json!(2))]);

        assert_eq!(store.clear().expect("clear"), 3);
        assert!(store.is_empty().expect("is_empty"));
        assert_eq!(store.clear().expect("clear"), 0);
    }

    #[test]
    fn concurrent_batches_are_not_lost() {
        let store = Arc::new(MemoryInventory::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        let batch = (0..4)
                            .map(|n| record_from(json!({"worker": worker, "n": n})))
                            .collect();
                        store.append_batch(batch).expect("batch");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker");
        }

        let records = store.snapshot().expect("snapshot");
        assert_eq!(records.len(), 8 * 25 * 4);
        // Each batch lands contiguously.
        for chunk in records.chunks(4) {
            let worker = chunk[0].get("worker");
            assert!(chunk.iter().all(|record| record.get("worker") == worker));
            let ns: Vec<_> = chunk.iter().filter_map(|r| r.get("n")).cloned().collect();
            assert_eq!(ns, vec![json!(0), json!(1), json!(2), json!(3)]);
        }
    }
}
