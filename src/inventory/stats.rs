use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Number, Value};

use super::{InventoryRecord, fields};

/// Aggregate view over the whole store, recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    /// Number of stored records.
    pub total_records: usize,
    /// Sum of `quantity` across records; missing or non-numeric counts as zero.
    pub total_products: Number,
    /// Number of distinct `productBarcode` values.
    pub unique_products: usize,
    /// Distinct non-empty sites in first-seen order.
    pub sites: Vec<Value>,
    /// Distinct non-empty floors in first-seen order.
    pub floors: Vec<Value>,
    /// Distinct non-empty rooms in first-seen order.
    pub rooms: Vec<Value>,
    /// Distinct non-empty shelves in first-seen order.
    pub shelves: Vec<Value>,
    /// `receivedAt` of the most recently appended record.
    pub last_update: Option<String>,
}

/// Compute statistics over a snapshot of the store.
pub fn compute_stats(records: &[InventoryRecord]) -> InventoryStats {
    let total: f64 = records.iter().map(quantity_of).sum();
    // Barcodes are compared by text, so `123` and `"123"` are one product.
    let unique_products = records
        .iter()
        .filter_map(|record| record.text(fields::PRODUCT_BARCODE))
        .collect::<HashSet<_>>()
        .len();

    InventoryStats {
        total_records: records.len(),
        total_products: to_number(total),
        unique_products,
        sites: distinct_values(records, fields::SITE),
        floors: distinct_values(records, fields::FLOOR),
        rooms: distinct_values(records, fields::ROOM),
        shelves: distinct_values(records, fields::SHELF),
        last_update: records
            .last()
            .and_then(|record| record.received_at().map(str::to_string)),
    }
}

fn quantity_of(record: &InventoryRecord) -> f64 {
    match record.get(fields::QUANTITY) {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => text.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

// Whole sums come back as integers so `5` does not render as `5.0`.
fn to_number(value: f64) -> Number {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        Number::from(value as i64)
    } else {
        Number::from_f64(value).unwrap_or_else(|| Number::from(0))
    }
}

fn distinct_values(records: &[InventoryRecord], key: &str) -> Vec<Value> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|record| {
            let text = record.text(key)?;
            if seen.insert(text) {
                record.get(key).cloned()
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::record_from;
    use serde_json::json;

    #[test]
    fn empty_store_has_zeroed_stats() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.total_products, Number::from(0));
        assert_eq!(stats.unique_products, 0);
        assert!(stats.sites.is_empty());
        assert_eq!(stats.last_update, None);
    }

    #[test]
    fn single_record_matches_documented_example() {
        let records = vec![record_from(json!({
            "productBarcode": "123",
            "site": "A",
            "quantity": 5,
            "receivedAt": "2026-10-19T08:00:00.000Z"
        }))];
        let stats = compute_stats(&records);
        assert_eq!(stats.total_products, Number::from(5));
        assert_eq!(stats.unique_products, 1);
        assert_eq!(stats.sites, vec![json!("A")]);
        assert_eq!(stats.last_update.as_deref(), Some("2026-10-19T08:00:00.000Z"));
    }

    #[test]
    fn duplicate_barcodes_count_once() {
        let records = vec![
            record_from(json!({"productBarcode": "123", "quantity": 1})),
            record_from(json!({"productBarcode": "123", "quantity": 2})),
            record_from(json!({"productBarcode": "456"})),
            record_from(json!({"quantity": 4})),
        ];
        let stats = compute_stats(&records);
        assert_eq!(stats.unique_products, 2);
        assert_eq!(stats.total_products, Number::from(7));
    }

    #[test]
    fn numeric_and_string_barcodes_with_same_text_are_one_product() {
        let records = vec![
            record_from(json!({"productBarcode": 123})),
            record_from(json!({"productBarcode": "123"})),
            record_from(json!({"productBarcode": "0123"})),
        ];
        assert_eq!(compute_stats(&records).unique_products, 2);
    }

    #[test]
    fn quantity_accepts_numeric_strings_and_fractions() {
        let records = vec![
            record_from(json!({"quantity": "3"})),
            record_from(json!({"quantity": 1.5})),
            record_from(json!({"quantity": "n/a"})),
            record_from(json!({"quantity": null})),
        ];
        let stats = compute_stats(&records);
        assert_eq!(stats.total_products, Number::from_f64(4.5).expect("finite"));
    }

    #[test]
    fn location_sets_skip_empty_and_keep_first_seen_order() {
        let records = vec![
            record_from(json!({"site": "B", "floor": 2, "room": "", "shelf": null})),
            record_from(json!({"site": "A", "floor": 2, "room": "R1"})),
            record_from(json!({"site": "B", "floor": 3, "room": "R1", "shelf": "S9"})),
        ];
        let stats = compute_stats(&records);
        assert_eq!(stats.sites, vec![json!("B"), json!("A")]);
        assert_eq!(stats.floors, vec![json!(2), json!(3)]);
        assert_eq!(stats.rooms, vec![json!("R1")]);
        assert_eq!(stats.shelves, vec![json!("S9")]);
    }

    #[test]
    fn last_update_tracks_latest_append() {
        let records = vec![
            record_from(json!({"receivedAt": "2026-10-19T08:00:00.000Z"})),
            record_from(json!({"receivedAt": "2026-10-19T09:00:00.000Z"})),
        ];
        assert_eq!(
            compute_stats(&records).last_update.as_deref(),
            Some("2026-10-19T09:00:00.000Z")
        );
    }
}
