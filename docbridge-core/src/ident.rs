//! Identifier classification, match resolution, and identifier assignment.
//!
//! A match argument given as a bare string is ambiguous: it may be a UUID, a
//! store-native object id, or just a field name. [`IdClassifier::classify`]
//! disambiguates it into a tagged [`IdKind`] purely from the string's format,
//! never from a store round trip, and [`IdClassifier::resolve`] turns a full
//! [`MatchSpec`] into the [`ResolvedMatch`] the CRUD layer consumes with an
//! exhaustive match.

use bson::{Bson, Document, doc, oid::ObjectId};
use uuid::Uuid;

use crate::schema::Payload;

/// The detected shape of a bare string match key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdKind {
    /// The string is a store-native object id.
    ObjectId(ObjectId),
    /// The string is a UUID.
    Uuid(Uuid),
    /// Neither of the above; the string names a field.
    FieldName,
}

/// A match argument: an explicit filter or a bare string key.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchSpec {
    /// Filter in the store's query language, used verbatim.
    Filter(Document),
    /// Bare string to be classified.
    Key(String),
}

impl From<Document> for MatchSpec {
    fn from(filter: Document) -> Self {
        MatchSpec::Filter(filter)
    }
}

impl From<&str> for MatchSpec {
    fn from(key: &str) -> Self {
        MatchSpec::Key(key.to_string())
    }
}

impl From<String> for MatchSpec {
    fn from(key: String) -> Self {
        MatchSpec::Key(key)
    }
}

/// A match argument after classification, ready for the store.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedMatch {
    /// Fetch-by-identifier filter; selects at most one document.
    ById(Document),
    /// Distinct-values request over the named field; not a filter at all.
    Distinct(String),
    /// Verbatim filter over the full collection.
    Filter(Document),
}

/// Syntactic classifier for bare string match keys.
///
/// Classification is a deterministic, total function: any string that is
/// neither an object id nor a UUID falls into [`IdKind::FieldName`]. Object
/// id detection runs first, so the two identifier formats never overlap.
#[derive(Debug, Clone, Default)]
pub struct IdClassifier {
    require_v4: bool,
}

impl IdClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept version-4 UUIDs as identifiers.
    ///
    /// Off by default; UUID classification is version-agnostic unless the
    /// deployment opts in to the stricter policy.
    pub fn require_v4(mut self, require: bool) -> Self {
        self.require_v4 = require;
        self
    }

    /// Classifies a candidate string by format alone.
    pub fn classify(&self, candidate: &str) -> IdKind {
        if let Ok(oid) = ObjectId::parse_str(candidate) {
            return IdKind::ObjectId(oid);
        }

        if let Ok(uuid) = Uuid::parse_str(candidate) {
            if !self.require_v4 || uuid.get_version_num() == 4 {
                return IdKind::Uuid(uuid);
            }
        }

        IdKind::FieldName
    }

    /// Resolves a match specification into the form the store consumes.
    ///
    /// UUIDs keep their textual representation in the filter because documents
    /// store them as plain strings; object ids keep their native type.
    pub fn resolve(&self, spec: MatchSpec) -> ResolvedMatch {
        match spec {
            MatchSpec::Filter(filter) => ResolvedMatch::Filter(filter),
            MatchSpec::Key(key) => match self.classify(&key) {
                IdKind::ObjectId(oid) => ResolvedMatch::ById(doc! { "_id": oid }),
                IdKind::Uuid(_) => ResolvedMatch::ById(doc! { "_id": key }),
                IdKind::FieldName => ResolvedMatch::Distinct(key),
            },
        }
    }
}

/// Ensures a document carries an identifier before insertion.
///
/// A present `_id` is preserved byte-for-byte; an absent one is filled with a
/// freshly generated random UUID in its canonical string form. The input is
/// consumed and a new value returned, so callers never observe a half-mutated
/// document.
pub fn ensure_id(mut document: Document) -> Document {
    if !document.contains_key("_id") {
        document.insert("_id", Bson::String(Uuid::new_v4().to_string()));
    }
    document
}

/// Element-wise [`ensure_id`] over a shape-preserving payload.
pub fn ensure_ids(payload: Payload) -> Payload {
    match payload {
        Payload::One(document) => Payload::One(ensure_id(document)),
        Payload::Many(documents) => {
            Payload::Many(documents.into_iter().map(ensure_id).collect())
        }
    }
}
