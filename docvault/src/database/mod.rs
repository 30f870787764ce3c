//! Collection and document operations against a vault database.
//!
//! When the service is built with an [`EncryptionEngine`], documents, filters
//! and updates are sealed before they leave the client and returned documents
//! are opened before they reach the caller. Result counts and identities are
//! always plaintext.

mod options;
mod results;

pub use options::{
    normalize_sort, CountOptions, FindOptions, InsertOptions, QueryOptions, SortItem, SortOrder,
    UpdateOptions,
};
pub use results::{DeleteResult, InsertResult, UpdateResult};

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::engine::EncryptionEngine;
use crate::error::Result;
use crate::pipeline::RequestPipeline;
use crate::response::{decode, decode_as, decode_unit};
use crate::transport::ApiRequest;
use results::{CountResponse, ItemsResponse};

const API_COLLECTION_ENDPOINT: &str = "/api/v2/vault/db/collection";
const API_COLLECTIONS_ENDPOINT: &str = "/api/v2/vault/db/collections";
const API_DB_ENDPOINT: &str = "/api/v2/vault/db";

/// Database operations of one vault session.
///
/// The encryption mode is fixed when the service is built; cloning shares
/// the pipeline and the engine.
#[derive(Clone)]
pub struct DatabaseService {
    pipeline: Arc<RequestPipeline>,
    engine: Option<Arc<EncryptionEngine>>,
}

impl DatabaseService {
    /// Creates a service that sends documents in the clear.
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self { pipeline, engine: None }
    }

    /// Creates a service that encrypts every document, filter and update.
    pub fn encrypted(pipeline: Arc<RequestPipeline>, engine: Arc<EncryptionEngine>) -> Self {
        Self { pipeline, engine: Some(engine) }
    }

    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        self.engine.is_some()
    }

    /// Creates a collection.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyExists` if the collection exists.
    pub async fn create_collection(&self, collection: &str) -> Result<()> {
        debug!(collection, "create collection");
        let request = ApiRequest::put(format!("{API_COLLECTIONS_ENDPOINT}/{collection}"));
        decode_unit(self.pipeline.send(&request).await?)
    }

    /// Deletes a collection and all its documents.
    ///
    /// # Errors
    ///
    /// Returns `Error::CollectionNotFound` if the collection does not exist.
    pub async fn delete_collection(&self, collection: &str) -> Result<()> {
        debug!(collection, "delete collection");
        let request = ApiRequest::delete(format!("{API_DB_ENDPOINT}/{collection}"));
        decode_unit(self.pipeline.send(&request).await?)
    }

    /// Inserts one document.
    ///
    /// Inserting the same document twice stores two records.
    ///
    /// # Errors
    ///
    /// Returns `Error::CollectionNotFound` for an unknown collection, or
    /// `Error::InvalidEncryptionInput` if encryption is on and `doc` is not
    /// an object.
    pub async fn insert_one(
        &self,
        collection: &str,
        doc: &Value,
        options: Option<&InsertOptions>,
    ) -> Result<InsertResult> {
        self.insert_many(collection, std::slice::from_ref(doc), options).await
    }

    /// Inserts documents in order.
    ///
    /// # Errors
    ///
    /// See [`Self::insert_one`].
    pub async fn insert_many(
        &self,
        collection: &str,
        docs: &[Value],
        options: Option<&InsertOptions>,
    ) -> Result<InsertResult> {
        debug!(collection, count = docs.len(), encrypted = self.is_encrypted(), "insert documents");
        let documents = match &self.engine {
            Some(engine) => engine.encrypt_documents(docs)?,
            None => docs.to_vec(),
        };

        let mut body = Map::new();
        body.insert("document".to_string(), Value::Array(documents));
        put_options(&mut body, options)?;

        let request = ApiRequest::post(format!("{API_COLLECTION_ENDPOINT}/{collection}"))
            .with_body(Value::Object(body));
        decode_as(self.pipeline.send(&request).await?)
    }

    /// Counts documents matching `filter` (`None` counts all).
    ///
    /// # Errors
    ///
    /// Returns `Error::CollectionNotFound` for an unknown collection.
    pub async fn count_documents(
        &self,
        collection: &str,
        filter: Option<&Value>,
        options: Option<&CountOptions>,
    ) -> Result<u64> {
        debug!(collection, "count documents");
        let mut body = Map::new();
        body.insert("filter".to_string(), self.seal_filter(filter)?);
        put_options(&mut body, options)?;

        let request = ApiRequest::post(format!("{API_COLLECTION_ENDPOINT}/{collection}"))
            .with_query("op", "count")
            .with_body(Value::Object(body));
        let response: CountResponse = decode_as(self.pipeline.send(&request).await?)?;
        Ok(response.count)
    }

    /// Returns the first document matching `filter`, or `None`.
    ///
    /// # Errors
    ///
    /// See [`Self::find_many`].
    pub async fn find_one(
        &self,
        collection: &str,
        filter: Option<&Value>,
        options: Option<&FindOptions>,
    ) -> Result<Option<Value>> {
        let options = options.copied().unwrap_or_default().with_limit(1);
        let docs = self.find_many(collection, filter, Some(&options)).await?;
        Ok(docs.into_iter().next())
    }

    /// Returns the documents matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `Error::CollectionNotFound` for an unknown collection, or
    /// `Error::DecryptionFailed` if a returned document was not sealed by
    /// this session's cipher.
    pub async fn find_many(
        &self,
        collection: &str,
        filter: Option<&Value>,
        options: Option<&FindOptions>,
    ) -> Result<Vec<Value>> {
        let filter = self.seal_filter(filter)?;
        let filter = if filter.is_null() { String::new() } else { filter.to_string() };
        let options = options.copied().unwrap_or_default();
        debug!(collection, skip = options.skip, limit = options.limit, "find documents");

        let request = ApiRequest::get(format!("{API_DB_ENDPOINT}/{collection}"))
            .with_query("filter", filter)
            .with_query("skip", options.skip.to_string())
            .with_query("limit", options.limit.to_string());
        let response: ItemsResponse = decode_as(self.pipeline.send(&request).await?)?;
        self.open_documents(response.items)
    }

    /// Runs a query with sort, projection and paging options.
    ///
    /// # Errors
    ///
    /// See [`Self::find_many`].
    pub async fn query(
        &self,
        collection: &str,
        filter: Option<&Value>,
        options: Option<&QueryOptions>,
    ) -> Result<Vec<Value>> {
        debug!(collection, "query documents");
        let mut body = Map::new();
        body.insert("collection".to_string(), Value::String(collection.to_string()));
        body.insert("filter".to_string(), self.seal_filter(filter)?);
        put_options(&mut body, options)?;

        let request =
            ApiRequest::post(format!("{API_DB_ENDPOINT}/query")).with_body(Value::Object(body));
        let response: ItemsResponse = decode_as(self.pipeline.send(&request).await?)?;
        self.open_documents(response.items)
    }

    /// Updates the first document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `Error::CollectionNotFound` for an unknown collection, or
    /// `Error::InvalidEncryptionInput` if encryption is on and `update` is
    /// not an object.
    pub async fn update_one(
        &self,
        collection: &str,
        filter: Option<&Value>,
        update: &Value,
        options: Option<&UpdateOptions>,
    ) -> Result<UpdateResult> {
        self.update(collection, true, filter, update, options).await
    }

    /// Updates every document matching `filter`.
    ///
    /// # Errors
    ///
    /// See [`Self::update_one`].
    pub async fn update_many(
        &self,
        collection: &str,
        filter: Option<&Value>,
        update: &Value,
        options: Option<&UpdateOptions>,
    ) -> Result<UpdateResult> {
        self.update(collection, false, filter, update, options).await
    }

    /// Deletes the first document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `Error::CollectionNotFound` for an unknown collection.
    pub async fn delete_one(
        &self,
        collection: &str,
        filter: Option<&Value>,
    ) -> Result<DeleteResult> {
        self.delete(collection, true, filter).await
    }

    /// Deletes every document matching `filter`.
    ///
    /// # Errors
    ///
    /// See [`Self::delete_one`].
    pub async fn delete_many(
        &self,
        collection: &str,
        filter: Option<&Value>,
    ) -> Result<DeleteResult> {
        self.delete(collection, false, filter).await
    }

    async fn update(
        &self,
        collection: &str,
        only_one: bool,
        filter: Option<&Value>,
        update: &Value,
        options: Option<&UpdateOptions>,
    ) -> Result<UpdateResult> {
        debug!(collection, only_one, "update documents");
        let update = match &self.engine {
            Some(engine) => engine.encrypt_update(update)?,
            None => update.clone(),
        };

        let mut body = Map::new();
        body.insert("filter".to_string(), self.seal_filter(filter)?);
        body.insert("update".to_string(), update);
        put_options(&mut body, options)?;

        let request = ApiRequest::patch(format!("{API_COLLECTION_ENDPOINT}/{collection}"))
            .with_query("updateone", only_one.to_string())
            .with_body(Value::Object(body));
        decode_as(self.pipeline.send(&request).await?)
    }

    async fn delete(
        &self,
        collection: &str,
        only_one: bool,
        filter: Option<&Value>,
    ) -> Result<DeleteResult> {
        debug!(collection, only_one, "delete documents");
        let request = ApiRequest::delete(format!("{API_COLLECTION_ENDPOINT}/{collection}"))
            .with_query("deleteone", only_one.to_string())
            .with_body(json!({ "filter": self.seal_filter(filter)? }));
        decode(self.pipeline.send(&request).await?, DeleteResult::from_payload)
    }

    fn seal_filter(&self, filter: Option<&Value>) -> Result<Value> {
        let filter = filter.cloned().unwrap_or(Value::Null);
        match &self.engine {
            Some(engine) => engine.encrypt_filter(&filter),
            None => Ok(filter),
        }
    }

    fn open_documents(&self, docs: Vec<Value>) -> Result<Vec<Value>> {
        match &self.engine {
            Some(engine) => engine.decrypt_documents(&docs),
            None => Ok(docs),
        }
    }
}

/// Adds `options` to the body; absent options are left out entirely.
fn put_options<T: Serialize>(
    body: &mut Map<String, Value>,
    options: Option<&T>,
) -> Result<()> {
    if let Some(options) = options {
        body.insert("options".to_string(), serde_json::to_value(options)?);
    }
    Ok(())
}
