//! Per-operation options sent alongside database calls.
//!
//! Unset fields are omitted from the wire body so the vault applies its own
//! defaults.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

/// Options for `insert_one` / `insert_many`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOptions {
    /// Opt out of document-level validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bypass_document_validation: Option<bool>,

    /// Insert serially and abort on the first failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordered: Option<bool>,

    /// Let the vault stamp `created`/`modified` fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<bool>,
}

impl InsertOptions {
    #[must_use]
    pub fn with_bypass_document_validation(mut self, value: bool) -> Self {
        self.bypass_document_validation = Some(value);
        self
    }

    #[must_use]
    pub fn with_ordered(mut self, value: bool) -> Self {
        self.ordered = Some(value);
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, value: bool) -> Self {
        self.timestamp = Some(value);
        self
    }
}

/// Options for `find_one` / `find_many`.
///
/// Sent as query parameters; `0` means "no skip" and "no limit".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindOptions {
    pub skip: u64,
    pub limit: u64,
}

impl FindOptions {
    #[must_use]
    pub const fn with_skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }
}

/// Options for `count_documents`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// Server-side time limit in milliseconds.
    #[serde(rename = "maxTimeMS", skip_serializing_if = "Option::is_none")]
    pub max_time_ms: Option<u64>,
}

impl CountOptions {
    #[must_use]
    pub const fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn with_max_time_ms(mut self, millis: u64) -> Self {
        self.max_time_ms = Some(millis);
        self
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Wire value: `1` ascending, `-1` descending.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

/// One `(key, direction)` pair of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortItem {
    pub key: String,
    pub order: SortOrder,
}

impl SortItem {
    pub fn ascending(key: impl Into<String>) -> Self {
        Self { key: key.into(), order: SortOrder::Ascending }
    }

    pub fn descending(key: impl Into<String>) -> Self {
        Self { key: key.into(), order: SortOrder::Descending }
    }
}

/// Converts sort items into the wire form `[[key, 1|-1], ...]`.
///
/// # Example
///
/// ```
/// use docvault::database::{normalize_sort, SortItem};
/// use serde_json::json;
///
/// let sort = [SortItem::ascending("_id"), SortItem::descending("title")];
/// assert_eq!(normalize_sort(&sort), json!([["_id", 1], ["title", -1]]));
/// ```
#[must_use]
pub fn normalize_sort(items: &[SortItem]) -> Value {
    Value::Array(items.iter().map(|item| json!([item.key, item.order.as_i32()])).collect())
}

fn serialize_sort<S: Serializer>(items: &[SortItem], serializer: S) -> Result<S::Ok, S::Error> {
    normalize_sort(items).serialize(serializer)
}

/// Options for `query`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// Fields to include or exclude, e.g. `{"title": 1}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<Value>,

    #[serde(
        default,
        serialize_with = "serialize_sort",
        skip_serializing_if = "Vec::is_empty",
        skip_deserializing
    )]
    pub sort: Vec<SortItem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_partial_results: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_key: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_record_id: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u64>,
}

impl QueryOptions {
    #[must_use]
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_projection(mut self, projection: Value) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Appends a sort key; earlier keys take precedence.
    #[must_use]
    pub fn with_sort(mut self, item: SortItem) -> Self {
        self.sort.push(item);
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}

/// Options for `update_one` / `update_many`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOptions {
    /// Insert a document when the filter matches none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upsert: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bypass_document_validation: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<bool>,
}

impl UpdateOptions {
    #[must_use]
    pub const fn with_upsert(mut self, value: bool) -> Self {
        self.upsert = Some(value);
        self
    }

    #[must_use]
    pub const fn with_bypass_document_validation(mut self, value: bool) -> Self {
        self.bypass_document_validation = Some(value);
        self
    }

    #[must_use]
    pub const fn with_timestamp(mut self, value: bool) -> Self {
        self.timestamp = Some(value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_fields_are_omitted() {
        assert_eq!(serde_json::to_value(InsertOptions::default()).unwrap(), json!({}));
        assert_eq!(serde_json::to_value(QueryOptions::default()).unwrap(), json!({}));
    }

    #[test]
    fn test_insert_options_wire() {
        let options = InsertOptions::default().with_ordered(true).with_timestamp(false);
        assert_eq!(
            serde_json::to_value(options).unwrap(),
            json!({"ordered": true, "timestamp": false})
        );
    }

    #[test]
    fn test_count_options_max_time_rename() {
        let options =
            CountOptions::default().with_skip(0).with_limit(1).with_max_time_ms(1_000_000_000);
        assert_eq!(
            serde_json::to_value(options).unwrap(),
            json!({"skip": 0, "limit": 1, "maxTimeMS": 1_000_000_000u64})
        );
    }

    #[test]
    fn test_query_sort_normalized() {
        let options = QueryOptions::default()
            .with_limit(10)
            .with_sort(SortItem::ascending("_id"))
            .with_sort(SortItem::descending("title"));

        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({"limit": 10, "sort": [["_id", 1], ["title", -1]]})
        );
    }

    #[test]
    fn test_update_options_wire() {
        let options =
            UpdateOptions::default().with_upsert(true).with_bypass_document_validation(false);
        assert_eq!(
            serde_json::to_value(options).unwrap(),
            json!({"upsert": true, "bypass_document_validation": false})
        );
    }
}
