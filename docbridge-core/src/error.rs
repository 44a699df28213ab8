//! Error types and result types for data layer operations.
//!
//! Every fallible operation in this crate returns [`DataResult<T>`]. Failures are
//! always typed values scoped to the single operation that produced them; nothing
//! is recovered locally and nothing is reported as a bare string.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use std::fmt;
use thiserror::Error;

/// Represents all possible errors produced by the data layer.
///
/// Validation carries a structured, per-field failure report so callers can
/// inspect it programmatically instead of parsing a message.
#[derive(Error, Debug)]
pub enum DataError {
    /// Schema validation failed. Carries one message per offending field.
    #[error("Validation failed: {0}")]
    Validation(ValidationFailure),
    /// The store is unreachable or the connection was lost.
    #[error("Store unreachable: {0}")]
    Connectivity(String),
    /// Empty or absent payload where one is required.
    #[error("Invalid input: {0}")]
    Input(String),
    /// A value of a type the validator or update builder cannot interpret.
    #[error("Unsupported shape: {0}")]
    UnsupportedShape(String),
    /// Required configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Serialization/deserialization error when converting document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// An error occurred in the underlying store driver.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for data layer operations.
pub type DataResult<T> = Result<T, DataError>;

/// A structured schema validation report.
///
/// Collects every offending field in a single pass, not just the first one.
/// For sequence payloads each entry also records the element index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFailure {
    errors: Vec<FieldError>,
}

/// One validation message attached to a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Index of the offending element when the payload was a sequence.
    pub index: Option<usize>,
    /// Name of the offending field.
    pub field: String,
    /// What was wrong with it.
    pub message: String,
}

impl ValidationFailure {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, index: Option<usize>, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            index,
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// All collected field errors, in schema order.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Names of every offending field, deduplicated in order of first appearance.
    pub fn fields(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for err in &self.errors {
            if !names.contains(&err.field.as_str()) {
                names.push(err.field.as_str());
            }
        }
        names
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            match err.index {
                Some(index) => write!(f, "[{}].{}: {}", index, err.field, err.message)?,
                None => write!(f, "{}: {}", err.field, err.message)?,
            }
        }
        Ok(())
    }
}

impl From<ValidationFailure> for DataError {
    fn from(failure: ValidationFailure) -> Self {
        DataError::Validation(failure)
    }
}

impl From<BsonError> for DataError {
    fn from(err: BsonError) -> Self {
        DataError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DataError {
    fn from(err: SerdeJsonError) -> Self {
        DataError::Serialization(err.to_string())
    }
}
