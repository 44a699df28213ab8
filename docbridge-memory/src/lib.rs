//! In-memory store backend for docbridge.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `StoreBackend` trait. It supports the query subset the data layer emits
//! (equality filters, `$set`/`$addToSet` updates with upsert, distinct,
//! `$match` aggregation) and is ideal for development and testing.
//!
//! # Quick Start
//!
//! ```ignore
//! use docbridge_core::{config::CollectionRef, layer::DataLayer, schema::{FieldType, Schema}};
//! use docbridge_memory::InMemoryStore;
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let layer = DataLayer::new(InMemoryStore::new());
//!     let schema = Schema::builder().required("name", FieldType::String).build();
//!     let target = CollectionRef::new("db", "people");
//!
//!     let ids = layer.insert(&schema, doc! { "name": "Alice" }, &target).await?;
//!     println!("inserted: {ids:?}");
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docbridge_memory;

mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
