//! MongoDB store backend for docbridge.
//!
//! This crate implements the `StoreBackend` trait over the official MongoDB
//! async driver: filters, update expressions, and aggregation pipelines built
//! by the data layer are handed to the driver verbatim. Aggregations run with
//! disk use allowed so large intermediate result sets may spill beyond memory.
//!
//! To use this backend, enable the `mongodb` feature of the `docbridge` crate:
//!
//! ```toml
//! [dependencies]
//! docbridge = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use docbridge_core::{backend::StoreBackendBuilder, config::StoreConfig, layer::DataLayer};
//! use docbridge_mongodb::MongoStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::from_env()?;
//!     let store = MongoStore::builder(&config.connection_string).build().await?;
//!     let layer = DataLayer::new(store);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docbridge_mongodb;

pub mod store;

pub use store::{MongoStore, MongoStoreBuilder};
