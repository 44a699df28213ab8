//! Declarative schema validation for documents.
//!
//! A [`Schema`] is a table of field definitions used in two directions:
//! [`Schema::load`] turns raw input into validated documents (coercing values,
//! applying defaults, collecting one error per offending field), and [`dump`]
//! turns stored documents into representations safe to return to a caller
//! (store-native identifiers become plain strings).
//!
//! Validation is shape-preserving: a single document in gives a single
//! document out, a sequence in gives a sequence out.

use bson::{Bson, Document};
use chrono::DateTime as ChronoDateTime;
use std::collections::BTreeMap;

use crate::error::{DataResult, ValidationFailure};

/// Input to (and output of) validation: one document or a sequence of them.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    One(Document),
    Many(Vec<Document>),
}

impl Payload {
    /// True for an empty sequence; a single document is never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::One(_) => false,
            Payload::Many(documents) => documents.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::One(_) => 1,
            Payload::Many(documents) => documents.len(),
        }
    }

    /// Flattens the payload, discarding its shape.
    pub fn into_documents(self) -> Vec<Document> {
        match self {
            Payload::One(document) => vec![document],
            Payload::Many(documents) => documents,
        }
    }
}

impl From<Document> for Payload {
    fn from(document: Document) -> Self {
        Payload::One(document)
    }
}

impl From<Vec<Document>> for Payload {
    fn from(documents: Vec<Document>) -> Self {
        Payload::Many(documents)
    }
}

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    /// Point in time; textual RFC 3339 input is coerced to a BSON datetime.
    Timestamp,
    /// Nested document.
    Object,
    /// Ordered sequence.
    Array,
}

impl FieldType {
    fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Timestamp => "timestamp",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }
}

/// Declaration of a single schema field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub field_type: FieldType,
    pub required: bool,
    pub default: Option<Bson>,
}

/// A declarative set of field definitions.
///
/// Build one with [`Schema::builder`]:
///
/// ```ignore
/// let schema = Schema::builder()
///     .required("name", FieldType::String)
///     .required("age", FieldType::Integer)
///     .with_default("role", FieldType::String, "user")
///     .build();
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: BTreeMap<String, FieldDef>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// The declared field definitions, in field name order.
    pub fn fields(&self) -> &BTreeMap<String, FieldDef> {
        &self.fields
    }

    /// Validates a payload element-wise, preserving its shape.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationFailure`] naming every missing, unknown, or
    /// uncoercible field across the whole payload, not just the first.
    pub fn load(&self, payload: impl Into<Payload>) -> DataResult<Payload> {
        let mut failure = ValidationFailure::new();

        let loaded = match payload.into() {
            Payload::One(document) => Payload::One(self.check(document, None, &mut failure)),
            Payload::Many(documents) => Payload::Many(
                documents
                    .into_iter()
                    .enumerate()
                    .map(|(index, document)| self.check(document, Some(index), &mut failure))
                    .collect(),
            ),
        };

        if failure.is_empty() {
            Ok(loaded)
        } else {
            Err(failure.into())
        }
    }

    /// Validates a single document.
    pub fn load_document(&self, document: Document) -> DataResult<Document> {
        let mut failure = ValidationFailure::new();
        let loaded = self.check(document, None, &mut failure);

        if failure.is_empty() {
            Ok(loaded)
        } else {
            Err(failure.into())
        }
    }

    /// Validates a partial document, as used in an update.
    ///
    /// Present fields are coerced and unknown fields rejected exactly as in
    /// [`Schema::load`], but absent fields are fine: required enforcement and
    /// defaults apply only to full documents.
    pub fn load_partial(&self, document: Document) -> DataResult<Document> {
        let mut failure = ValidationFailure::new();
        let loaded = self.check_present(document, None, &mut failure);

        if failure.is_empty() {
            Ok(loaded)
        } else {
            Err(failure.into())
        }
    }

    fn check(
        &self,
        document: Document,
        index: Option<usize>,
        failure: &mut ValidationFailure,
    ) -> Document {
        let mut loaded = self.check_present(document, index, failure);

        for (name, def) in &self.fields {
            if loaded.contains_key(name) {
                continue;
            }
            if let Some(default) = &def.default {
                loaded.insert(name.clone(), default.clone());
            } else if def.required {
                failure.push(index, name.clone(), "missing required field");
            }
        }

        loaded
    }

    fn check_present(
        &self,
        document: Document,
        index: Option<usize>,
        failure: &mut ValidationFailure,
    ) -> Document {
        let mut loaded = Document::new();

        for (key, value) in document {
            // Identifiers are not schema fields; they always pass through.
            if key == "_id" {
                loaded.insert(key, value);
                continue;
            }

            match self.fields.get(&key) {
                Some(def) => match coerce(value, def.field_type) {
                    Ok(coerced) => {
                        loaded.insert(key, coerced);
                    }
                    Err(message) => failure.push(index, key, message),
                },
                None => failure.push(index, key, "unknown field"),
            }
        }

        loaded
    }
}

/// Builder for [`Schema`] definitions.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    fields: BTreeMap<String, FieldDef>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field that must be present on every document.
    pub fn required(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(
            name.into(),
            FieldDef { field_type, required: true, default: None },
        );
        self
    }

    /// Declares a field that may be absent.
    pub fn optional(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(
            name.into(),
            FieldDef { field_type, required: false, default: None },
        );
        self
    }

    /// Declares a field filled with a default value when absent.
    pub fn with_default(
        mut self,
        name: impl Into<String>,
        field_type: FieldType,
        default: impl Into<Bson>,
    ) -> Self {
        self.fields.insert(
            name.into(),
            FieldDef { field_type, required: false, default: Some(default.into()) },
        );
        self
    }

    pub fn build(self) -> Schema {
        Schema { fields: self.fields }
    }
}

fn coerce(value: Bson, field_type: FieldType) -> Result<Bson, String> {
    let rejected = |value: &Bson| format!("cannot coerce {:?} to {}", value, field_type.name());

    match field_type {
        FieldType::String => match value {
            Bson::String(_) => Ok(value),
            other => Err(rejected(&other)),
        },
        FieldType::Integer => match value {
            Bson::Int32(_) | Bson::Int64(_) => Ok(value),
            Bson::Double(d) if d.fract() == 0.0 => Ok(Bson::Int64(d as i64)),
            Bson::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Bson::Int64)
                .map_err(|_| format!("cannot coerce {:?} to integer", s)),
            other => Err(rejected(&other)),
        },
        FieldType::Float => match value {
            Bson::Double(_) => Ok(value),
            Bson::Int32(i) => Ok(Bson::Double(i as f64)),
            Bson::Int64(i) => Ok(Bson::Double(i as f64)),
            Bson::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Bson::Double)
                .map_err(|_| format!("cannot coerce {:?} to float", s)),
            other => Err(rejected(&other)),
        },
        FieldType::Boolean => match value {
            Bson::Boolean(_) => Ok(value),
            Bson::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" => Ok(Bson::Boolean(true)),
                "false" => Ok(Bson::Boolean(false)),
                _ => Err(format!("cannot coerce {:?} to boolean", s)),
            },
            other => Err(rejected(&other)),
        },
        FieldType::Timestamp => match value {
            Bson::DateTime(_) => Ok(value),
            Bson::String(s) => ChronoDateTime::parse_from_rfc3339(&s)
                .map(|parsed| Bson::DateTime(bson::DateTime::from_chrono(parsed)))
                .map_err(|_| format!("cannot coerce {:?} to timestamp", s)),
            other => Err(rejected(&other)),
        },
        FieldType::Object => match value {
            Bson::Document(_) => Ok(value),
            other => Err(rejected(&other)),
        },
        FieldType::Array => match value {
            Bson::Array(_) => Ok(value),
            other => Err(rejected(&other)),
        },
    }
}

/// Normalizes a stored document for return to a caller.
///
/// A store-native object id in `_id` becomes its plain hex string; every other
/// field passes through unchanged.
pub fn dump(mut document: Document) -> Document {
    if let Some(Bson::ObjectId(oid)) = document.get("_id") {
        let hex = oid.to_hex();
        document.insert("_id", Bson::String(hex));
    }
    document
}

/// Element-wise [`dump`].
pub fn dump_all(documents: Vec<Document>) -> Vec<Document> {
    documents.into_iter().map(dump).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};

    fn person() -> Schema {
        Schema::builder()
            .required("name", FieldType::String)
            .required("age", FieldType::Integer)
            .with_default("role", FieldType::String, "user")
            .build()
    }

    #[test]
    fn load_coerces_textual_integers() {
        let loaded = person()
            .load_document(doc! { "name": "John", "age": "20" })
            .unwrap();

        assert_eq!(loaded.get_i64("age").unwrap(), 20);
        assert_eq!(loaded.get_str("role").unwrap(), "user");
    }

    #[test]
    fn load_names_every_offending_field() {
        let err = person()
            .load_document(doc! { "age": "not-a-number", "extra": 1 })
            .unwrap_err();

        let crate::error::DataError::Validation(failure) = err else {
            panic!("expected a validation failure");
        };
        let mut fields = failure.fields();
        fields.sort();
        assert_eq!(fields, vec!["age", "extra", "name"]);
    }

    #[test]
    fn load_missing_required_field_names_it() {
        let err = person().load_document(doc! { "name": "John" }).unwrap_err();

        let crate::error::DataError::Validation(failure) = err else {
            panic!("expected a validation failure");
        };
        assert_eq!(failure.fields(), vec!["age"]);
    }

    #[test]
    fn load_partial_skips_required_enforcement_and_defaults() {
        let loaded = person().load_partial(doc! { "age": "21" }).unwrap();

        assert_eq!(loaded.get_i64("age").unwrap(), 21);
        assert!(!loaded.contains_key("role"));

        let err = person().load_partial(doc! { "extra": 1 }).unwrap_err();
        let crate::error::DataError::Validation(failure) = err else {
            panic!("expected a validation failure");
        };
        assert_eq!(failure.fields(), vec!["extra"]);
    }

    #[test]
    fn load_preserves_payload_shape() {
        let schema = person();

        let one = schema.load(doc! { "name": "A", "age": 1 }).unwrap();
        assert!(matches!(one, Payload::One(_)));

        let many = schema
            .load(vec![doc! { "name": "A", "age": 1 }, doc! { "name": "B", "age": 2 }])
            .unwrap();
        let Payload::Many(documents) = many else {
            panic!("shape changed");
        };
        assert_eq!(documents.len(), 2);
    }

    #[test]
    fn load_reports_sequence_indexes() {
        let err = person()
            .load(vec![doc! { "name": "A", "age": 1 }, doc! { "name": "B" }])
            .unwrap_err();

        let crate::error::DataError::Validation(failure) = err else {
            panic!("expected a validation failure");
        };
        assert_eq!(failure.errors()[0].index, Some(1));
        assert_eq!(failure.errors()[0].field, "age");
    }

    #[test]
    fn load_coerces_rfc3339_timestamps() {
        let schema = Schema::builder()
            .required("seen_at", FieldType::Timestamp)
            .build();

        let loaded = schema
            .load_document(doc! { "seen_at": "2021-06-01T12:30:00Z" })
            .unwrap();

        assert!(matches!(loaded.get("seen_at"), Some(Bson::DateTime(_))));
    }

    #[test]
    fn load_passes_id_through_untouched() {
        let loaded = person()
            .load_document(doc! { "_id": "u1", "name": "A", "age": 3 })
            .unwrap();

        assert_eq!(loaded.get_str("_id").unwrap(), "u1");
    }

    #[test]
    fn dump_stringifies_object_ids() {
        let oid = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let dumped = dump(doc! { "_id": oid, "name": "A" });

        assert_eq!(dumped.get_str("_id").unwrap(), "507f1f77bcf86cd799439011");
        assert_eq!(dumped.get_str("name").unwrap(), "A");
    }

    #[test]
    fn dump_leaves_string_ids_alone() {
        let dumped = dump(doc! { "_id": "u1", "name": "A" });

        assert_eq!(dumped.get_str("_id").unwrap(), "u1");
    }
}
