//! The CRUD facade composing validation, identifier handling, and the store.
//!
//! [`DataLayer`] is the public operation surface. Each operation validates and
//! normalizes its input, then delegates to the [`StoreBackend`] in a single
//! call. The layer keeps no per-call state: the target database and collection
//! travel in an immutable [`CollectionRef`] argument, so one instance can be
//! shared freely across concurrent callers.

use bson::{Bson, Document};
use log::{debug, warn};

use crate::{
    backend::{StoreBackend, UpdateOutcome},
    config::CollectionRef,
    error::{DataError, DataResult},
    ident::{IdClassifier, MatchSpec, ResolvedMatch, ensure_ids},
    schema::{Payload, Schema, dump, dump_all},
    update::{UpdateMode, build_update},
};

/// Result of a fetch, shaped by how the match argument was classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// By-identifier fetch: the first match, or nothing. Never a collection.
    One(Option<Document>),
    /// Filter fetch: every matching document.
    Documents(Vec<Document>),
    /// Field-name fetch: the distinct values of that field.
    Values(Vec<Bson>),
}

/// Result of a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deleted {
    /// Count of documents removed by a filter.
    Documents(u64),
    /// The match named the collection itself, so the collection was dropped.
    DroppedCollection,
}

/// Generic CRUD operations over a schema-validated document collection.
#[derive(Debug)]
pub struct DataLayer<B: StoreBackend> {
    backend: B,
    classifier: IdClassifier,
}

impl<B: StoreBackend> DataLayer<B> {
    /// Creates a layer with the default (version-agnostic) classifier policy.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            classifier: IdClassifier::new(),
        }
    }

    /// Creates a layer with an explicit classifier policy.
    pub fn with_classifier(backend: B, classifier: IdClassifier) -> Self {
        Self { backend, classifier }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Inserts one or many validated documents.
    ///
    /// Input is validated against `schema` and every document is guaranteed an
    /// identifier before it reaches the store. Returns the identifiers, as
    /// strings, in the exact order the documents were submitted.
    ///
    /// # Errors
    ///
    /// [`DataError::Validation`] when the payload fails the schema,
    /// [`DataError::Input`] when the payload is an empty sequence, and
    /// [`DataError::Connectivity`] when the store is unreachable.
    pub async fn insert(
        &self,
        schema: &Schema,
        data: impl Into<Payload>,
        target: &CollectionRef,
    ) -> DataResult<Vec<String>> {
        let payload = data.into();
        if payload.is_empty() {
            return Err(DataError::Input("no documents provided".to_string()));
        }

        let validated = ensure_ids(schema.load(payload)?);
        debug!(
            "inserting {} document(s) into {}.{}",
            validated.len(),
            target.database,
            target.collection
        );

        let ids = match validated {
            Payload::One(document) => vec![self.backend.insert_one(target, document).await?],
            Payload::Many(documents) => self.backend.insert_many(target, documents).await?,
        };

        Ok(ids.into_iter().map(id_string).collect())
    }

    /// Fetches documents (or distinct field values) selected by `spec`.
    ///
    /// A bare string is classified first: identifier formats fetch a single
    /// document by `_id`, anything else is treated as a field name and returns
    /// that field's distinct values. An explicit filter returns the full
    /// matching set. All outgoing documents have store-native identifiers
    /// normalized to plain strings.
    pub async fn fetch(
        &self,
        spec: impl Into<MatchSpec>,
        target: &CollectionRef,
    ) -> DataResult<Fetched> {
        match self.classifier.resolve(spec.into()) {
            ResolvedMatch::ById(filter) => {
                let found = self.backend.find_one(target, filter).await?;
                Ok(Fetched::One(found.map(dump)))
            }
            ResolvedMatch::Distinct(field) => {
                let values = self.backend.distinct(target, &field).await?;
                Ok(Fetched::Values(values))
            }
            ResolvedMatch::Filter(filter) => {
                let found = self.backend.find(target, filter).await?;
                Ok(Fetched::Documents(dump_all(found)))
            }
        }
    }

    /// Updates every document matching `spec` with a validated partial document.
    ///
    /// The update expression is built per `mode` (see [`UpdateMode`]); `_id`
    /// is stripped from the payload first. The operation upserts: a filter
    /// matching nothing inserts a new document and reports it via
    /// [`UpdateOutcome::upserted_id`] with `modified == 0`.
    ///
    /// # Errors
    ///
    /// A bare string match that is not an identifier is rejected as
    /// [`DataError::Input`]; field names select distinct values, not update
    /// targets.
    pub async fn update(
        &self,
        schema: &Schema,
        spec: impl Into<MatchSpec>,
        new_data: impl Into<Bson>,
        target: &CollectionRef,
        mode: UpdateMode,
    ) -> DataResult<UpdateOutcome> {
        let filter = match self.classifier.resolve(spec.into()) {
            ResolvedMatch::ById(filter) | ResolvedMatch::Filter(filter) => filter,
            ResolvedMatch::Distinct(key) => {
                return Err(DataError::Input(format!(
                    "match {key:?} is neither an identifier nor a filter"
                )));
            }
        };

        let new_data = new_data.into();
        let Bson::Document(new_data) = new_data else {
            return Err(DataError::UnsupportedShape(
                "update payload must be a mapping of fields to values".to_string(),
            ));
        };

        let validated = schema.load_partial(new_data)?;
        let expression = build_update(validated, mode)?;

        self.backend
            .update_many(target, filter, expression, true)
            .await
    }

    /// Deletes documents matching `spec`, or drops the whole collection.
    ///
    /// Compatibility behavior: a bare string match equal to the target
    /// collection's own name drops the entire collection instead of deleting
    /// documents. Prefer the explicit [`DataLayer::drop_collection`] in new
    /// code.
    pub async fn delete(
        &self,
        spec: impl Into<MatchSpec>,
        target: &CollectionRef,
    ) -> DataResult<Deleted> {
        let filter = match self.classifier.resolve(spec.into()) {
            ResolvedMatch::ById(filter) | ResolvedMatch::Filter(filter) => filter,
            ResolvedMatch::Distinct(key) if key == target.collection => {
                warn!(
                    "delete match equals collection name; dropping {}.{}",
                    target.database, target.collection
                );
                self.backend.drop_collection(target).await?;
                return Ok(Deleted::DroppedCollection);
            }
            ResolvedMatch::Distinct(key) => {
                return Err(DataError::Input(format!(
                    "match {key:?} is neither an identifier nor a filter"
                )));
            }
        };

        let deleted = self.backend.delete_many(target, filter).await?;
        Ok(Deleted::Documents(deleted))
    }

    /// Drops the target collection outright.
    pub async fn drop_collection(&self, target: &CollectionRef) -> DataResult<()> {
        self.backend.drop_collection(target).await
    }

    /// Runs an aggregation pipeline, passed through to the store verbatim.
    ///
    /// Disk-backed aggregation is always permitted so large intermediate
    /// result sets may spill beyond memory. Results are identifier-normalized
    /// like every other fetch.
    pub async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        target: &CollectionRef,
    ) -> DataResult<Vec<Document>> {
        let results = self.backend.aggregate(target, pipeline, true).await?;
        Ok(dump_all(results))
    }

    /// Shuts the layer down, releasing backend resources.
    pub async fn shutdown(self) -> DataResult<()> {
        self.backend.shutdown().await
    }
}

fn id_string(id: Bson) -> String {
    match id {
        Bson::String(s) => s,
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}
