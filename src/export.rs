//! CSV and JSON renderings of the full store for download.

use csv::{QuoteStyle, WriterBuilder};
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

use crate::clock::file_stamp;
use crate::inventory::{InventoryRecord, fields};

/// Column names of the CSV export, in order.
pub const CSV_COLUMNS: [&str; 8] = [
    "Timestamp",
    "Site",
    "Floor",
    "Room",
    "Shelf",
    "Product_Barcode",
    "Quantity",
    "Received_At",
];

/// Header row of the CSV export as it appears in the file.
pub const CSV_HEADER: &str =
    "Timestamp,Site,Floor,Room,Shelf,Product_Barcode,Quantity,Received_At";

const MISSING_LOCATION: &str = "NULL";

/// Failures while rendering an export body.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer rejected a record or failed to flush.
    #[error("CSV writer error: {0}")]
    Csv(#[from] csv::Error),
    /// Rendered CSV was not valid UTF-8.
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// Records could not be serialized as JSON.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Download format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Quoted comma-separated rows under [`CSV_HEADER`].
    Csv,
    /// Pretty-printed JSON array of the records.
    Json,
}

impl ExportFormat {
    /// `Content-Type` for the download.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Attachment filename, e.g. `inventory_20261019T083000Z.csv`.
    pub fn filename(self, at: OffsetDateTime) -> String {
        format!("inventory_{}.{}", file_stamp(at), self.extension())
    }
}

/// Render records as CSV, one `\n`-terminated row per record under a bare header row.
///
/// Every data cell is quoted and embedded quotes are doubled. Missing location fields print
/// `NULL`, a missing quantity prints `0`, and other missing fields print an empty cell.
pub fn to_csv(records: &[InventoryRecord]) -> Result<String, ExportError> {
    let mut header = WriterBuilder::new().from_writer(Vec::new());
    header.write_record(CSV_COLUMNS)?;
    let buffer = header
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;

    let mut rows = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(buffer);
    for record in records {
        rows.write_record(csv_row(record))?;
    }
    let data = rows
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8(data)?)
}

fn csv_row(record: &InventoryRecord) -> [String; 8] {
    let or_empty = |key: &str| record.text(key).unwrap_or_default();
    let or_null = |key: &str| {
        record
            .text(key)
            .unwrap_or_else(|| MISSING_LOCATION.to_string())
    };

    [
        or_empty(fields::TIMESTAMP),
        or_null(fields::SITE),
        or_null(fields::FLOOR),
        or_null(fields::ROOM),
        or_null(fields::SHELF),
        or_empty(fields::PRODUCT_BARCODE),
        quantity_cell(record.get(fields::QUANTITY)),
        or_empty(fields::RECEIVED_AT),
    ]
}

fn quantity_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "0".to_string(),
        Some(Value::String(text)) if text.is_empty() => "0".to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render records as a pretty-printed JSON array, fields verbatim.
pub fn to_json(records: &[InventoryRecord]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::record_from;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn empty_store_is_header_only() {
        assert_eq!(to_csv(&[]).expect("csv"), format!("{CSV_HEADER}\n"));
    }

    #[test]
    fn full_record_renders_every_column() {
        let record = record_from(json!({
            "timestamp": "2026-10-19T07:59:00Z",
            "site": "A",
            "floor": 2,
            "room": "R1",
            "shelf": "S3",
            "productBarcode": "123",
            "quantity": 5,
            "receivedAt": "2026-10-19T08:00:00.000Z"
        }));
        let csv = to_csv(&[record]).expect("csv");
        let rows: Vec<_> = csv.lines().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1],
            "\"2026-10-19T07:59:00Z\",\"A\",\"2\",\"R1\",\"S3\",\"123\",\"5\",\"2026-10-19T08:00:00.000Z\""
        );
    }

    #[test]
    fn missing_fields_use_placeholders() {
        let csv = to_csv(&[record_from(json!({"productBarcode": "9"}))]).expect("csv");
        assert_eq!(
            csv.lines().nth(1),
            Some("\"\",\"NULL\",\"NULL\",\"NULL\",\"NULL\",\"9\",\"0\",\"\"")
        );
    }

    #[test]
    fn one_row_per_record() {
        let records: Vec<_> = (0..4)
            .map(|n| record_from(json!({"productBarcode": n.to_string()})))
            .collect();
        assert_eq!(to_csv(&records).expect("csv").lines().count(), 5);
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let csv = to_csv(&[record_from(json!({"site": "Dock \"B\", east", "quantity": "2"}))])
            .expect("csv");
        let row = csv.lines().nth(1).expect("row");
        assert!(row.contains("\"Dock \"\"B\"\", east\""));
        assert!(row.contains(",\"2\","));
    }

    #[test]
    fn exported_rows_parse_back_with_a_csv_reader() {
        let records = vec![
            record_from(json!({"site": "Dock \"B\", east", "productBarcode": "1", "quantity": 3})),
            record_from(json!({"shelf": "line\nbreak", "productBarcode": "2"})),
        ];
        let rendered = to_csv(&records).expect("csv");
        let mut reader = csv::Reader::from_reader(rendered.as_bytes());
        let headers = reader.headers().expect("headers").clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), CSV_COLUMNS.to_vec());

        let rows: Vec<csv::StringRecord> = reader
            .records()
            .collect::<Result<_, _>>()
            .expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "Dock \"B\", east");
        assert_eq!(&rows[0][6], "3");
        assert_eq!(&rows[1][4], "line\nbreak");
        assert_eq!(&rows[1][6], "0");
    }

    #[test]
    fn json_export_keeps_fields_verbatim() {
        let record = record_from(json!({"productBarcode": "123", "extra": {"nested": true}}));
        let rendered = to_json(std::slice::from_ref(&record)).expect("json");
        let parsed: Value = serde_json::from_str(&rendered).expect("parse");
        assert_eq!(parsed, json!([{"productBarcode": "123", "extra": {"nested": true}}]));
    }

    #[test]
    fn filenames_embed_the_timestamp() {
        let at = datetime!(2026-10-19 08:30:00 UTC);
        assert_eq!(ExportFormat::Csv.filename(at), "inventory_20261019T083000Z.csv");
        assert_eq!(ExportFormat::Json.filename(at), "inventory_20261019T083000Z.json");
    }
}
