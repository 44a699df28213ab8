//! In-memory storage implementation for the data layer.
//!
//! Stores documents as BSON values in nested HashMaps behind an async-aware
//! read-write lock. Intended for development, testing, and small deployments;
//! every query is a linear scan over the collection.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use log::debug;
use mea::rwlock::RwLock;

use docbridge_core::{
    backend::{StoreBackend, StoreBackendBuilder, UpdateOutcome},
    config::CollectionRef,
    error::{DataError, DataResult},
};

use crate::evaluator::{apply_update, bson_eq, distinct_values, matches, seed_from_filter};

type CollectionVec = Vec<Document>;
type DatabaseMap = HashMap<String, CollectionVec>;
type StoreMap = HashMap<String, DatabaseMap>;

/// Thread-safe in-memory document store.
///
/// Cloneable; clones share the same underlying data through an `Arc`. Insert
/// order is preserved within each collection, which makes find-first semantics
/// deterministic.
///
/// Supports the query subset the data layer emits: equality filters (dotted
/// paths included), `$set`/`$addToSet` update expressions with upsert,
/// distinct values, and `$match`-only aggregation pipelines.
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// database name -> collection name -> documents in insert order
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

fn document_id(document: &Document) -> Option<&Bson> {
    document.get("_id")
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn find_one(
        &self,
        target: &CollectionRef,
        filter: Document,
    ) -> DataResult<Option<Document>> {
        let store = self.store.read().await;
        let Some(documents) = store
            .get(&target.database)
            .and_then(|db| db.get(&target.collection))
        else {
            return Ok(None);
        };

        for document in documents {
            if matches(document, &filter)? {
                return Ok(Some(document.clone()));
            }
        }

        Ok(None)
    }

    async fn find(&self, target: &CollectionRef, filter: Document) -> DataResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(documents) = store
            .get(&target.database)
            .and_then(|db| db.get(&target.collection))
        else {
            return Ok(vec![]);
        };

        let mut found = Vec::new();
        for document in documents {
            if matches(document, &filter)? {
                found.push(document.clone());
            }
        }

        Ok(found)
    }

    async fn distinct(&self, target: &CollectionRef, field: &str) -> DataResult<Vec<Bson>> {
        let store = self.store.read().await;
        let Some(documents) = store
            .get(&target.database)
            .and_then(|db| db.get(&target.collection))
        else {
            return Ok(vec![]);
        };

        Ok(distinct_values(documents.iter(), field))
    }

    async fn insert_one(&self, target: &CollectionRef, document: Document) -> DataResult<Bson> {
        Ok(self
            .insert_many(target, vec![document])
            .await?
            .remove(0))
    }

    async fn insert_many(
        &self,
        target: &CollectionRef,
        documents: Vec<Document>,
    ) -> DataResult<Vec<Bson>> {
        let mut store = self.store.write().await;
        let collection = store
            .entry(target.database.clone())
            .or_default()
            .entry(target.collection.clone())
            .or_default();

        let mut ids = Vec::with_capacity(documents.len());
        for mut document in documents {
            // The store assigns a native object id when the caller supplied none.
            if document_id(&document).is_none() {
                document.insert("_id", Bson::ObjectId(ObjectId::new()));
            }
            let id = document_id(&document).cloned().unwrap_or(Bson::Null);

            if collection
                .iter()
                .any(|present| document_id(present).is_some_and(|pid| bson_eq(pid, &id)))
            {
                return Err(DataError::Backend(format!(
                    "duplicate key {id:?} in {}.{}",
                    target.database, target.collection
                )));
            }

            collection.push(document);
            ids.push(id);
        }

        Ok(ids)
    }

    async fn update_many(
        &self,
        target: &CollectionRef,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> DataResult<UpdateOutcome> {
        let mut store = self.store.write().await;
        let collection = store
            .entry(target.database.clone())
            .or_default()
            .entry(target.collection.clone())
            .or_default();

        let mut outcome = UpdateOutcome::default();
        for document in collection.iter_mut() {
            if matches(document, &filter)? {
                outcome.matched += 1;
                if apply_update(document, &update)? {
                    outcome.modified += 1;
                }
            }
        }

        if outcome.matched == 0 && upsert {
            let mut seeded = seed_from_filter(&filter);
            apply_update(&mut seeded, &update)?;
            if document_id(&seeded).is_none() {
                seeded.insert("_id", Bson::ObjectId(ObjectId::new()));
            }
            outcome.upserted_id = document_id(&seeded).cloned();
            collection.push(seeded);
        }

        Ok(outcome)
    }

    async fn delete_many(&self, target: &CollectionRef, filter: Document) -> DataResult<u64> {
        let mut store = self.store.write().await;
        let Some(collection) = store
            .get_mut(&target.database)
            .and_then(|db| db.get_mut(&target.collection))
        else {
            return Ok(0);
        };

        let before = collection.len();
        let mut kept = Vec::with_capacity(before);
        for document in collection.drain(..) {
            if !matches(&document, &filter)? {
                kept.push(document);
            }
        }
        *collection = kept;

        Ok((before - collection.len()) as u64)
    }

    async fn drop_collection(&self, target: &CollectionRef) -> DataResult<()> {
        let mut store = self.store.write().await;

        // Dropping an absent collection is fine, as it is on a real store.
        if let Some(db) = store.get_mut(&target.database) {
            if db.remove(&target.collection).is_some() {
                debug!("dropped {}.{}", target.database, target.collection);
            }
        }

        Ok(())
    }

    async fn aggregate(
        &self,
        target: &CollectionRef,
        pipeline: Vec<Document>,
        _allow_disk_use: bool,
    ) -> DataResult<Vec<Document>> {
        let store = self.store.read().await;
        let mut documents = store
            .get(&target.database)
            .and_then(|db| db.get(&target.collection))
            .cloned()
            .unwrap_or_default();

        for stage in &pipeline {
            match stage.iter().next() {
                Some((name, Bson::Document(filter))) if name == "$match" => {
                    let mut remaining = Vec::with_capacity(documents.len());
                    for document in documents {
                        if matches(&document, filter)? {
                            remaining.push(document);
                        }
                    }
                    documents = remaining;
                }
                Some((stage_name, _)) => {
                    return Err(DataError::Backend(format!(
                        "unsupported pipeline stage {stage_name:?}"
                    )));
                }
                None => {}
            }
        }

        Ok(documents)
    }
}

/// Builder for [`InMemoryStore`] instances.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DataResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}
