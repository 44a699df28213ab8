//! Translation of partial documents into store update expressions.
//!
//! Two semantics are supported: [`UpdateMode::Set`] replaces each given
//! top-level field wholesale, while [`UpdateMode::Append`] merges nested
//! objects field-by-field (via dotted paths) and adds sequence elements
//! without duplicating ones already present (delegated to the store's
//! add-to-set operation). The reserved `_id` key is always stripped first:
//! identifiers are immutable after creation.

use bson::{Bson, Document, doc};

use crate::error::{DataError, DataResult};

/// How a partial update document is applied to matching documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Replace every given top-level field with its given value.
    #[default]
    Set,
    /// Merge nested objects and append to arrays instead of replacing.
    Append,
}

/// Builds a store update expression from a partial document.
///
/// # Errors
///
/// Returns [`DataError::UnsupportedShape`] when the payload is not a mapping
/// and [`DataError::Input`] when nothing remains once `_id` is stripped.
pub fn build_update(partial: impl Into<Bson>, mode: UpdateMode) -> DataResult<Document> {
    let Bson::Document(mut partial) = partial.into() else {
        return Err(DataError::UnsupportedShape(
            "update payload must be a mapping of fields to values".to_string(),
        ));
    };

    partial.remove("_id");

    if partial.is_empty() {
        return Err(DataError::Input(
            "update payload has no fields beyond _id".to_string(),
        ));
    }

    match mode {
        UpdateMode::Set => Ok(doc! { "$set": partial }),
        UpdateMode::Append => Ok(build_append(partial)),
    }
}

fn build_append(partial: Document) -> Document {
    let mut set = Document::new();
    let mut add_to_set = Document::new();

    for (key, value) in partial {
        match value {
            Bson::Document(nested) => {
                for (child, child_value) in nested {
                    set.insert(format!("{key}.{child}"), child_value);
                }
            }
            Bson::Array(elements) => {
                add_to_set.insert(key, doc! { "$each": elements });
            }
            scalar => {
                set.insert(key, scalar);
            }
        }
    }

    // Empty clauses are omitted rather than sent to the store.
    let mut expression = Document::new();
    if !set.is_empty() {
        expression.insert("$set", set);
    }
    if !add_to_set.is_empty() {
        expression.insert("$addToSet", add_to_set);
    }
    expression
}
