//! Convenient re-exports of commonly used types from docbridge.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docbridge::prelude::*;
//! ```
//!
//! This provides access to:
//! - The data layer facade and its fetch/delete result types
//! - Schema declaration and payload types
//! - Match specifications and identifier classification
//! - Store backend traits and builders
//! - Configuration and error types

pub use docbridge_core::{
    backend::{StoreBackend, StoreBackendBuilder, UpdateOutcome},
    config::{CollectionRef, StoreConfig},
    error::{DataError, DataResult, FieldError, ValidationFailure},
    ident::{IdClassifier, IdKind, MatchSpec, ResolvedMatch},
    layer::{DataLayer, Deleted, Fetched},
    schema::{FieldDef, FieldType, Payload, Schema, SchemaBuilder},
    update::UpdateMode,
};
