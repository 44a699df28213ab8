//! Store backend abstraction for the data layer.
//!
//! The [`StoreBackend`] trait is the layer's only outward boundary. Every
//! method is a single request/response against one collection, addressed by a
//! per-call [`CollectionRef`]; the layer never holds a mutable "current"
//! database or collection. Implementations must be thread-safe
//! (`Send + Sync`) and are expected to map driver failures onto
//! [`DataError::Connectivity`](crate::error::DataError::Connectivity) or
//! [`DataError::Backend`](crate::error::DataError::Backend).

use async_trait::async_trait;
use bson::{Bson, Document};
use std::fmt::Debug;

use crate::{config::CollectionRef, error::DataResult};

/// Counts reported by an update operation.
///
/// Matched, modified, and upserted are deliberately kept apart: an upsert of a
/// brand-new document reports `matched == 0` and `modified == 0` alongside its
/// `upserted_id`, and a match whose stored value already equals the update
/// counts as matched but not modified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOutcome {
    /// Documents selected by the filter.
    pub matched: u64,
    /// Documents actually changed.
    pub modified: u64,
    /// Identifier assigned when the update inserted a new document.
    pub upserted_id: Option<Bson>,
}

/// Abstract interface to a document store.
///
/// Implementers provide the actual storage, indexing, and query execution;
/// the data layer composes validation and identifier handling on top and
/// delegates every operation here in a single call.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Returns the first document matching the filter, if any.
    async fn find_one(
        &self,
        target: &CollectionRef,
        filter: Document,
    ) -> DataResult<Option<Document>>;

    /// Returns every document matching the filter.
    async fn find(&self, target: &CollectionRef, filter: Document) -> DataResult<Vec<Document>>;

    /// Returns the distinct values of one field across the collection.
    async fn distinct(&self, target: &CollectionRef, field: &str) -> DataResult<Vec<Bson>>;

    /// Inserts one document, returning its assigned identifier.
    async fn insert_one(&self, target: &CollectionRef, document: Document) -> DataResult<Bson>;

    /// Inserts several documents, returning their identifiers in submission order.
    async fn insert_many(
        &self,
        target: &CollectionRef,
        documents: Vec<Document>,
    ) -> DataResult<Vec<Bson>>;

    /// Applies an update expression to every document matching the filter.
    ///
    /// With `upsert` set, a filter matching nothing inserts a new document
    /// seeded from the filter's equality pairs.
    async fn update_many(
        &self,
        target: &CollectionRef,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> DataResult<UpdateOutcome>;

    /// Deletes every document matching the filter, returning the count removed.
    async fn delete_many(&self, target: &CollectionRef, filter: Document) -> DataResult<u64>;

    /// Drops the whole collection. Dropping an absent collection succeeds.
    async fn drop_collection(&self, target: &CollectionRef) -> DataResult<()>;

    /// Runs an aggregation pipeline verbatim.
    ///
    /// `allow_disk_use` permits intermediate result sets to spill beyond
    /// memory on stores that support disk-backed aggregation.
    async fn aggregate(
        &self,
        target: &CollectionRef,
        pipeline: Vec<Document>,
        allow_disk_use: bool,
    ) -> DataResult<Vec<Document>>;

    /// Cleanly shuts down the backend, releasing any driver resources.
    ///
    /// The default implementation is a no-op; backends holding connections
    /// should override it.
    async fn shutdown(self) -> DataResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn find_one(
        &self,
        target: &CollectionRef,
        filter: Document,
    ) -> DataResult<Option<Document>> {
        (*self).find_one(target, filter).await
    }

    async fn find(&self, target: &CollectionRef, filter: Document) -> DataResult<Vec<Document>> {
        (*self).find(target, filter).await
    }

    async fn distinct(&self, target: &CollectionRef, field: &str) -> DataResult<Vec<Bson>> {
        (*self).distinct(target, field).await
    }

    async fn insert_one(&self, target: &CollectionRef, document: Document) -> DataResult<Bson> {
        (*self).insert_one(target, document).await
    }

    async fn insert_many(
        &self,
        target: &CollectionRef,
        documents: Vec<Document>,
    ) -> DataResult<Vec<Bson>> {
        (*self).insert_many(target, documents).await
    }

    async fn update_many(
        &self,
        target: &CollectionRef,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> DataResult<UpdateOutcome> {
        (*self)
            .update_many(target, filter, update, upsert)
            .await
    }

    async fn delete_many(&self, target: &CollectionRef, filter: Document) -> DataResult<u64> {
        (*self).delete_many(target, filter).await
    }

    async fn drop_collection(&self, target: &CollectionRef) -> DataResult<()> {
        (*self).drop_collection(target).await
    }

    async fn aggregate(
        &self,
        target: &CollectionRef,
        pipeline: Vec<Document>,
        allow_disk_use: bool,
    ) -> DataResult<Vec<Document>> {
        (*self)
            .aggregate(target, pipeline, allow_disk_use)
            .await
    }
}

/// Factory trait for constructing backend instances.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DataResult<Self::Backend>;
}
