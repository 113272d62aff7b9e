//! Parsing and applying `POST /api/inventory` bodies.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::inventory::{AppendOutcome, InventoryRecord, InventoryStore, StoreError, UNKNOWN_SOURCE};

/// Ingest body rejected before touching the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    /// Body is not JSON, names an unknown action, or `data` has the wrong shape.
    #[error("invalid ingest payload: {0}")]
    InvalidFormat(&'static str),
}

/// What a validated ingest body asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestCommand {
    /// `add_inventory`: one record.
    Add(Map<String, Value>),
    /// `sync_inventory`: records in order.
    Sync(Vec<Map<String, Value>>),
}

/// Validated ingest body.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestRequest {
    /// Requested operation with its records.
    pub command: IngestCommand,
    /// Origin label stamped on every record.
    pub source: String,
}

// `version` is accepted by clients but carries no meaning here.
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    source: Option<Value>,
}

impl IngestRequest {
    /// Validate a raw request body.
    pub fn parse(body: &[u8]) -> Result<Self, IngestError> {
        let envelope: Envelope = serde_json::from_slice(body)
            .map_err(|_| IngestError::InvalidFormat("body is not a JSON object"))?;

        let command = match (envelope.action.as_deref(), envelope.data) {
            (Some("add_inventory"), Some(Value::Object(fields))) => IngestCommand::Add(fields),
            (Some("add_inventory"), _) => {
                return Err(IngestError::InvalidFormat("add_inventory needs an object"));
            }
            (Some("sync_inventory"), Some(Value::Array(items))) => IngestCommand::Sync(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(fields) => Ok(fields),
                        _ => Err(IngestError::InvalidFormat(
                            "sync_inventory elements must be objects",
                        )),
                    })
                    .collect::<Result<_, _>>()?,
            ),
            (Some("sync_inventory"), _) => {
                return Err(IngestError::InvalidFormat("sync_inventory needs an array"));
            }
            _ => return Err(IngestError::InvalidFormat("unknown action")),
        };

        let source = match envelope.source {
            Some(Value::String(source)) if !source.is_empty() => source,
            _ => UNKNOWN_SOURCE.to_string(),
        };

        Ok(Self { command, source })
    }

    /// Stamp the records with `received_at` and the source label, then append them.
    pub fn apply<S>(self, store: &S, received_at: &str) -> Result<IngestOutcome, StoreError>
    where
        S: InventoryStore + ?Sized,
    {
        let source = self.source;
        match self.command {
            IngestCommand::Add(fields) => store
                .append(InventoryRecord::stamped(fields, received_at, &source))
                .map(IngestOutcome::Added),
            IngestCommand::Sync(items) => {
                let records = items
                    .into_iter()
                    .map(|fields| InventoryRecord::stamped(fields, received_at, &source))
                    .collect();
                store.append_batch(records).map(IngestOutcome::Synced)
            }
        }
    }
}

/// Store result of an applied ingest, tagged by action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Single record appended.
    Added(AppendOutcome),
    /// Batch appended.
    Synced(AppendOutcome),
}
