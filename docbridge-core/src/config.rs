//! Environment-based configuration and per-call collection targeting.
//!
//! Configuration is resolved once, at construction, into a [`StoreConfig`] value.
//! A missing required variable is a typed [`DataError::Configuration`], never a
//! silently absent global. Each data layer call then receives an immutable
//! [`CollectionRef`] naming the target database and collection; there is no
//! mutable "currently selected" database or collection anywhere in the layer,
//! so concurrent callers cannot contaminate each other's targets.

use std::env;

use crate::error::{DataError, DataResult};

/// Environment variable holding the store connection string (required).
pub const ENV_CONNECTION_STRING: &str = "DOCBRIDGE_CONNECTION_STRING";
/// Environment variable holding the database name (optional).
pub const ENV_DATABASE_NAME: &str = "DOCBRIDGE_DATABASE_NAME";
/// Environment variable holding the default collection name (optional).
pub const ENV_COLLECTION_NAME: &str = "DOCBRIDGE_COLLECTION_NAME";

const DEFAULT_DATABASE: &str = "db";
const DEFAULT_COLLECTION: &str = "data";

/// Resolved store configuration.
///
/// Built either explicitly with [`StoreConfig::new`] or from the environment
/// with [`StoreConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Connection string understood by the store driver.
    pub connection_string: String,
    /// Database targeted when a call does not override it.
    pub database: String,
    /// Collection targeted when a call does not override it.
    pub default_collection: String,
}

impl StoreConfig {
    pub fn new(
        connection_string: impl Into<String>,
        database: impl Into<String>,
        default_collection: impl Into<String>,
    ) -> Self {
        Self {
            connection_string: connection_string.into(),
            database: database.into(),
            default_collection: default_collection.into(),
        }
    }

    /// Resolves configuration from the environment.
    ///
    /// The connection string is required; database and collection names fall
    /// back to `"db"` and `"data"` when unset.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Configuration`] naming the missing variable.
    pub fn from_env() -> DataResult<Self> {
        let connection_string = env::var(ENV_CONNECTION_STRING).map_err(|_| {
            DataError::Configuration(format!("{ENV_CONNECTION_STRING} is not set"))
        })?;

        Ok(Self {
            connection_string,
            database: env::var(ENV_DATABASE_NAME).unwrap_or_else(|_| DEFAULT_DATABASE.to_string()),
            default_collection: env::var(ENV_COLLECTION_NAME)
                .unwrap_or_else(|_| DEFAULT_COLLECTION.to_string()),
        })
    }

    /// The default target derived from this configuration.
    pub fn target(&self) -> CollectionRef {
        CollectionRef::new(&self.database, &self.default_collection)
    }

    /// A target in the configured database with a different collection.
    pub fn target_in(&self, collection: &str) -> CollectionRef {
        CollectionRef::new(&self.database, collection)
    }
}

/// Immutable per-call target: one collection within one database.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionRef {
    pub database: String,
    pub collection: String,
}

impl CollectionRef {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// A new target pointing at a different collection in the same database.
    pub fn with_collection(&self, collection: impl Into<String>) -> Self {
        Self::new(self.database.clone(), collection)
    }

    /// A new target pointing at the same collection in a different database.
    pub fn with_database(&self, database: impl Into<String>) -> Self {
        Self::new(database, self.collection.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_overrides_produce_new_values() {
        let config = StoreConfig::new("mongodb://localhost:27017", "appdb", "records");
        let target = config.target();

        assert_eq!(target, CollectionRef::new("appdb", "records"));

        let other = target.with_collection("archive");
        assert_eq!(other, CollectionRef::new("appdb", "archive"));
        // The original target is untouched.
        assert_eq!(target.collection, "records");

        let elsewhere = other.with_database("reporting");
        assert_eq!(elsewhere, CollectionRef::new("reporting", "archive"));
    }
}
