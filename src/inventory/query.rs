use super::{InventoryRecord, fields};

/// Query-string parameters accepted by `GET /api/inventory`.
///
/// Empty values are treated as absent. `limit` stays textual so a malformed value is ignored
/// instead of failing the request.
#[derive(Debug, Clone, Default)]
pub struct InventoryQuery {
    /// Exact match on `site`.
    pub site: Option<String>,
    /// Exact match on `floor`.
    pub floor: Option<String>,
    /// Exact match on `room`.
    pub room: Option<String>,
    /// Exact match on `shelf`.
    pub shelf: Option<String>,
    /// Exact match on `productBarcode`.
    pub product: Option<String>,
    /// Keep only the trailing N matches.
    pub limit: Option<String>,
}

impl InventoryQuery {
    /// Build from decoded query pairs. A repeated name keeps its last value; unknown names
    /// are ignored.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query = Self::default();
        for (name, value) in pairs {
            let slot = match name.as_str() {
                "site" => &mut query.site,
                "floor" => &mut query.floor,
                "room" => &mut query.room,
                "shelf" => &mut query.shelf,
                "product" => &mut query.product,
                "limit" => &mut query.limit,
                _ => continue,
            };
            *slot = Some(value);
        }
        query
    }

    /// Active filters in application order: site, floor, room, shelf, product.
    fn active_filters(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (fields::SITE, self.site.as_deref()),
            (fields::FLOOR, self.floor.as_deref()),
            (fields::ROOM, self.room.as_deref()),
            (fields::SHELF, self.shelf.as_deref()),
            (fields::PRODUCT_BARCODE, self.product.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v)))
    }
}

/// Last value given for `name` among decoded query pairs.
pub fn last_param<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Parse a trailing-N limit. Anything that is not a non-negative integer yields `None`.
pub fn parse_limit(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|value| value.trim().parse().ok())
}

/// Keep the last `limit` items, preserving order.
pub fn take_last<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    let skip = items.len().saturating_sub(limit);
    items.drain(..skip);
    items
}

/// Apply the AND-combined exact-match filters and the optional trailing limit.
pub fn filter_records(records: Vec<InventoryRecord>, query: &InventoryQuery) -> Vec<InventoryRecord> {
    let mut matched = records;
    for (key, expected) in query.active_filters() {
        matched.retain(|record| record.field_equals(key, expected));
    }
    match parse_limit(query.limit.as_deref()) {
        Some(limit) => take_last(matched, limit),
        None => matched,
    }
}
