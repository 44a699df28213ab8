//! A validated CRUD convenience layer over document stores.
//!
//! This crate is the core of the docbridge project and provides:
//!
//! - **Schema validation** ([`schema`]) - Declarative field definitions with coercion and defaults
//! - **Identifier handling** ([`ident`]) - Match-key classification and identifier assignment
//! - **Update expressions** ([`update`]) - Set and append translation of partial documents
//! - **CRUD facade** ([`layer`]) - The public operation surface over a store backend
//! - **Store backend abstraction** ([`backend`]) - Trait for implementing storage backends
//! - **Configuration** ([`config`]) - Environment-resolved store settings and per-call targets
//! - **Error handling** ([`error`]) - Typed error and result types
//!
//! # Example
//!
//! ```ignore
//! use docbridge_core::{
//!     config::CollectionRef,
//!     layer::DataLayer,
//!     schema::{FieldType, Schema},
//! };
//! use bson::doc;
//!
//! let schema = Schema::builder()
//!     .required("name", FieldType::String)
//!     .required("age", FieldType::Integer)
//!     .build();
//!
//! let layer = DataLayer::new(backend);
//! let target = CollectionRef::new("appdb", "people");
//! let ids = layer.insert(&schema, doc! { "name": "John", "age": "20" }, &target).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docbridge_core;

pub mod backend;
pub mod config;
pub mod error;
pub mod ident;
pub mod layer;
pub mod schema;
pub mod update;
