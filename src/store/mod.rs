mod schema;
mod sqlite;
mod transaction;
mod watch;

pub use sqlite::SqliteStore;
pub use transaction::{Transaction, Write};
pub use watch::{Snapshot, Subscription};

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Field map stored in a document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Address of a document: a collection and an id within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    pub collection: String,
    pub id: String,
}

impl DocPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocPath,
    pub fields: Fields,
    /// Commit sequence number of the last write to this document.
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(serde_json::Value::Object(self.fields.clone())).map_err(Error::from)
    }
}

/// DocumentStore is the backing store the group protocol runs against.
///
/// Writes either go through `run_atomic` or are single-document writes that
/// commit on their own. Every committed change is published to subscribers of
/// the touched paths.
pub trait DocumentStore: Send + Sync {
    fn initialize(&self) -> Result<()>;

    fn get(&self, path: &DocPath) -> Result<Option<Document>>;
    fn set(&self, path: &DocPath, fields: Fields, merge: bool) -> Result<()>;
    fn delete(&self, path: &DocPath) -> Result<bool>;
    fn list(&self, collection: &str) -> Result<Vec<Document>>;

    /// Runs `body` against a fresh transaction and commits its writes if no
    /// document it read has changed in the meantime. On conflict the body is
    /// run again; an `Err` from the body aborts without writing anything.
    fn run_atomic(&self, body: &mut dyn FnMut(&mut Transaction<'_>) -> Result<()>) -> Result<()>;

    fn subscribe(&self, path: &DocPath) -> Result<Subscription>;
}

/// Typed wrapper over [`DocumentStore::run_atomic`] returning the body's value
/// from the attempt that committed.
pub fn atomically<S, T, F>(store: &S, mut body: F) -> Result<T>
where
    S: DocumentStore + ?Sized,
    F: FnMut(&mut Transaction<'_>) -> Result<T>,
{
    let mut output = None;
    store.run_atomic(&mut |tx: &mut Transaction<'_>| {
        output = Some(body(tx)?);
        Ok(())
    })?;
    output.ok_or_else(|| Error::BackendUnavailable("transaction committed without output".into()))
}
