//! Filter matching and update application for the in-memory store.
//!
//! Implements the subset of the store query language the data layer emits:
//! equality filters (with dotted-path traversal), `$set` and `$addToSet`
//! update expressions, and distinct value collection. Numeric values are
//! compared after normalization so an `Int32` and an `Int64` holding the same
//! number are equal, as they are in a real store.

use bson::{Bson, Document};

use docbridge_core::error::{DataError, DataResult};

/// Looks a dotted path up in a document.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut current = document;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let value = current.get(segment)?;
        if segments.peek().is_none() {
            return Some(value);
        }
        current = value.as_document()?;
    }

    None
}

/// Sets a dotted path in a document, creating intermediate documents as needed.
pub(crate) fn set_path(document: &mut Document, path: &str, value: Bson) {
    let mut current = document;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment, value);
            return;
        }

        if !matches!(current.get(segment), Some(Bson::Document(_))) {
            current.insert(segment, Document::new());
        }
        // Present by construction.
        let Some(Bson::Document(next)) = current.get_mut(segment) else {
            return;
        };
        current = next;
    }
}

/// Value equality with numeric normalization.
pub(crate) fn bson_eq(left: &Bson, right: &Bson) -> bool {
    match (as_number(left), as_number(right)) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(i) => Some(*i as f64),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(d) => Some(*d),
        _ => None,
    }
}

/// Whether a document satisfies an equality filter.
///
/// An empty filter matches everything. Filter keys may be dotted paths.
pub(crate) fn matches(document: &Document, filter: &Document) -> DataResult<bool> {
    for (path, expected) in filter {
        if path.starts_with('$') || is_operator_document(expected) {
            return Err(DataError::Backend(format!(
                "in-memory store supports equality filters only, got {path:?}"
            )));
        }

        match lookup(document, path) {
            Some(actual) if bson_eq(actual, expected) => {}
            _ => return Ok(false),
        }
    }

    Ok(true)
}

fn is_operator_document(value: &Bson) -> bool {
    value
        .as_document()
        .is_some_and(|doc| doc.keys().any(|key| key.starts_with('$')))
}

/// Applies an update expression in place, reporting whether anything changed.
pub(crate) fn apply_update(document: &mut Document, expression: &Document) -> DataResult<bool> {
    let mut changed = false;

    for (operator, clause) in expression {
        let Some(clause) = clause.as_document() else {
            return Err(DataError::Backend(format!(
                "malformed {operator} clause in update expression"
            )));
        };

        match operator.as_str() {
            "$set" => {
                for (path, value) in clause {
                    if lookup(document, path).is_none_or(|current| !bson_eq(current, value)) {
                        set_path(document, path, value.clone());
                        changed = true;
                    }
                }
            }
            "$addToSet" => {
                for (key, spec) in clause {
                    let additions: Vec<Bson> = match spec {
                        Bson::Document(inner) => match inner.get("$each") {
                            Some(Bson::Array(elements)) => elements.clone(),
                            Some(other) => vec![other.clone()],
                            None => vec![spec.clone()],
                        },
                        other => vec![other.clone()],
                    };

                    if document.get(key).is_none() {
                        document.insert(key.clone(), Bson::Array(Vec::new()));
                    }
                    let Some(Bson::Array(existing)) = document.get_mut(key) else {
                        return Err(DataError::Backend(format!(
                            "cannot add to set on non-array field {key:?}"
                        )));
                    };

                    for addition in additions {
                        if !existing.iter().any(|present| bson_eq(present, &addition)) {
                            existing.push(addition);
                            changed = true;
                        }
                    }
                }
            }
            other => {
                return Err(DataError::Backend(format!(
                    "unsupported update operator {other:?}"
                )));
            }
        }
    }

    Ok(changed)
}

/// Builds the seed document for an upsert from a filter's equality pairs.
pub(crate) fn seed_from_filter(filter: &Document) -> Document {
    let mut seed = Document::new();
    for (path, value) in filter {
        if !path.starts_with('$') && !is_operator_document(value) {
            set_path(&mut seed, path, value.clone());
        }
    }
    seed
}

/// Collects the distinct values of one field across a collection.
///
/// Array-valued fields are unwound into their elements, matching store
/// distinct semantics. First-seen order is preserved.
pub(crate) fn distinct_values<'a>(
    documents: impl IntoIterator<Item = &'a Document>,
    field: &str,
) -> Vec<Bson> {
    let mut values: Vec<Bson> = Vec::new();
    let mut push = |value: &Bson, values: &mut Vec<Bson>| {
        if !values.iter().any(|present| bson_eq(present, value)) {
            values.push(value.clone());
        }
    };

    for document in documents {
        match lookup(document, field) {
            Some(Bson::Array(elements)) => {
                for element in elements {
                    push(element, &mut values);
                }
            }
            Some(value) => push(value, &mut values),
            None => {}
        }
    }

    values
}
