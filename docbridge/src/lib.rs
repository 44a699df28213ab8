//! Main docbridge crate providing a validated CRUD layer over document stores.
//!
//! This crate is the primary entry point for users of docbridge. It re-exports
//! the core modules and provides convenient access to the storage backends.
//!
//! # Features
//!
//! - **Schema validation** - Declare field types, requirements, and defaults; input is
//!   coerced and every offending field is reported, not just the first
//! - **Identifier normalization** - Bare string match keys are classified as UUIDs,
//!   store-native object ids, or field names; documents get UUIDs assigned on insert
//! - **Generic CRUD** - Insert, fetch, update (set or append semantics), delete, and
//!   aggregation-pipeline passthrough over any `StoreBackend`
//! - **Multiple backends** - In-memory store for development and testing, MongoDB
//!   behind the `mongodb` feature
//!
//! # Quick Start
//!
//! ```ignore
//! use docbridge::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let layer = DataLayer::new(InMemoryStore::new());
//!     let target = CollectionRef::new("appdb", "people");
//!
//!     let schema = Schema::builder()
//!         .required("name", FieldType::String)
//!         .required("age", FieldType::Integer)
//!         .build();
//!
//!     // Textual "20" is coerced to integer 20 by the schema.
//!     let ids = layer
//!         .insert(&schema, doc! { "name": "John", "age": "20" }, &target)
//!         .await
//!         .unwrap();
//!
//!     // Fetch back by the returned identifier.
//!     let fetched = layer.fetch(ids[0].as_str(), &target).await.unwrap();
//!     println!("fetched: {fetched:?}");
//!
//!     layer.shutdown().await.unwrap();
//! }
//! ```
//!
//! # Match arguments
//!
//! Fetch and delete accept either an explicit filter document or a bare
//! string. A string is classified purely by format: a UUID or a 24-hex object
//! id selects one document by `_id`; any other string names a field whose
//! distinct values are returned.
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires the `mongodb` feature)

pub use docbridge_core::{backend, config, error, ident, layer, schema, update};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docbridge_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docbridge_mongodb::{MongoStore, MongoStoreBuilder};
}

pub mod prelude;
