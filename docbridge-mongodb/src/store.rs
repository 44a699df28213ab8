use async_trait::async_trait;
use bson::{Bson, Document};
use futures::TryStreamExt;
use log::debug;
use mongodb::{
    Client, Collection as MongoCollection,
    error::{Error as MongoError, ErrorKind},
    options::ClientOptions,
};

use docbridge_core::{
    backend::{StoreBackend, StoreBackendBuilder, UpdateOutcome},
    config::{CollectionRef, StoreConfig},
    error::{DataError, DataResult},
};

/// MongoDB-backed store.
///
/// Holds one shared client; the database and collection for each operation
/// come from the per-call [`CollectionRef`], so a single store serves any
/// number of databases over the same connection.
#[derive(Debug)]
pub struct MongoStore {
    client: Client,
}

impl MongoStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn builder(connection_string: &str) -> MongoStoreBuilder {
        MongoStoreBuilder::new(connection_string)
    }

    fn collection(&self, target: &CollectionRef) -> MongoCollection<Document> {
        self.client
            .database(&target.database)
            .collection(&target.collection)
    }
}

fn driver_error(err: MongoError) -> DataError {
    match *err.kind {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => {
            DataError::Connectivity(err.to_string())
        }
        _ => DataError::Backend(err.to_string()),
    }
}

#[async_trait]
impl StoreBackend for MongoStore {
    async fn find_one(
        &self,
        target: &CollectionRef,
        filter: Document,
    ) -> DataResult<Option<Document>> {
        self.collection(target)
            .find_one(filter)
            .await
            .map_err(driver_error)
    }

    async fn find(&self, target: &CollectionRef, filter: Document) -> DataResult<Vec<Document>> {
        self.collection(target)
            .find(filter)
            .await
            .map_err(driver_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(driver_error)
    }

    async fn distinct(&self, target: &CollectionRef, field: &str) -> DataResult<Vec<Bson>> {
        self.collection(target)
            .distinct(field, Document::new())
            .await
            .map_err(driver_error)
    }

    async fn insert_one(&self, target: &CollectionRef, document: Document) -> DataResult<Bson> {
        Ok(self
            .collection(target)
            .insert_one(document)
            .await
            .map_err(driver_error)?
            .inserted_id)
    }

    async fn insert_many(
        &self,
        target: &CollectionRef,
        documents: Vec<Document>,
    ) -> DataResult<Vec<Bson>> {
        let count = documents.len();
        let result = self
            .collection(target)
            .insert_many(documents)
            .await
            .map_err(driver_error)?;

        // inserted_ids is keyed by submission index; restore submission order.
        let mut ids = Vec::with_capacity(count);
        for index in 0..count {
            let id = result.inserted_ids.get(&index).cloned().ok_or_else(|| {
                DataError::Backend(format!("driver reported no id for document {index}"))
            })?;
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
        let result = self
            .collection(target)
            .update_many(filter, update)
            .upsert(upsert)
            .await
            .map_err(driver_error)?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn delete_many(&self, target: &CollectionRef, filter: Document) -> DataResult<u64> {
        Ok(self
            .collection(target)
            .delete_many(filter)
            .await
            .map_err(driver_error)?
            .deleted_count)
    }

    async fn drop_collection(&self, target: &CollectionRef) -> DataResult<()> {
        debug!("dropping {}.{}", target.database, target.collection);
        self.collection(target)
            .drop()
            .await
            .map_err(driver_error)
    }

    async fn aggregate(
        &self,
        target: &CollectionRef,
        pipeline: Vec<Document>,
        allow_disk_use: bool,
    ) -> DataResult<Vec<Document>> {
        self.collection(target)
            .aggregate(pipeline)
            .allow_disk_use(allow_disk_use)
            .await
            .map_err(driver_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(driver_error)
    }

    async fn shutdown(self) -> DataResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

/// Builder connecting a [`MongoStore`] from a connection string.
pub struct MongoStoreBuilder {
    connection_string: String,
}

impl MongoStoreBuilder {
    pub fn new(connection_string: &str) -> Self {
        Self {
            connection_string: connection_string.to_string(),
        }
    }

    /// Builder primed from resolved configuration.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.connection_string)
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoStoreBuilder {
    type Backend = MongoStore;

    async fn build(self) -> DataResult<Self::Backend> {
        let options = ClientOptions::parse(&self.connection_string)
            .await
            .map_err(|e| DataError::Configuration(e.to_string()))?;
        let client =
            Client::with_options(options).map_err(|e| DataError::Configuration(e.to_string()))?;

        Ok(MongoStore::new(client))
    }
}
