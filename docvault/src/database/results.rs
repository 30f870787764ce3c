//! Typed results of write operations. Never encrypted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of `insert_one` / `insert_many`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertResult {
    #[serde(rename = "acknowledge", alias = "acknowledged", default)]
    pub acknowledged: bool,

    /// Identities assigned by the vault, in insertion order.
    pub inserted_ids: Vec<String>,
}

impl InsertResult {
    #[must_use]
    pub fn inserted_count(&self) -> usize {
        self.inserted_ids.len()
    }
}

/// Result of `update_one` / `update_many`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    #[serde(default)]
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,

    /// Identity of the inserted document when an upsert matched nothing.
    #[serde(default)]
    pub upserted_id: Option<String>,
}

/// Result of `delete_one` / `delete_many`.
///
/// Vaults that answer deletes with an empty body produce the default value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub(crate) fn from_payload(payload: Value) -> Result<Self, serde_json::Error> {
        if payload.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(payload)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemsResponse {
    pub items: Vec<Value>,
}
