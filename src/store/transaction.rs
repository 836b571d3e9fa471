use std::collections::BTreeMap;

use super::{DocPath, Document, DocumentStore, Fields};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Set { fields: Fields, merge: bool },
    Delete,
}

/// Read-set/write-set buffer for one attempt of an atomic body.
///
/// Reads go straight to the store and record the version observed (`None`
/// for an absent document). Collection scans record every id and version
/// listed, so a document added to or removed from the collection also counts
/// as a conflict. Writes are only buffered; the store applies them at commit,
/// after checking every recorded version is still current.
pub struct Transaction<'a> {
    store: &'a dyn DocumentStore,
    reads: BTreeMap<DocPath, Option<i64>>,
    scans: BTreeMap<String, Vec<(String, i64)>>,
    writes: Vec<(DocPath, Write)>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            reads: BTreeMap::new(),
            scans: BTreeMap::new(),
            writes: Vec::new(),
        }
    }

    pub fn get(&mut self, path: &DocPath) -> Result<Option<Document>> {
        if !self.writes.is_empty() {
            return Err(Error::ReadAfterWrite(path.to_string()));
        }
        let doc = self.store.get(path)?;
        self.reads
            .entry(path.clone())
            .or_insert_with(|| doc.as_ref().map(|d| d.version));
        Ok(doc)
    }

    /// Lists a collection, ordered by id.
    pub fn list(&mut self, collection: &str) -> Result<Vec<Document>> {
        if !self.writes.is_empty() {
            return Err(Error::ReadAfterWrite(collection.to_string()));
        }
        let docs = self.store.list(collection)?;
        self.scans.entry(collection.to_string()).or_insert_with(|| {
            docs.iter()
                .map(|doc| (doc.path.id.clone(), doc.version))
                .collect()
        });
        Ok(docs)
    }

    pub fn set(&mut self, path: &DocPath, fields: Fields, merge: bool) {
        self.writes
            .push((path.clone(), Write::Set { fields, merge }));
    }

    pub fn delete(&mut self, path: &DocPath) {
        self.writes.push((path.clone(), Write::Delete));
    }

    pub(crate) fn reads(&self) -> &BTreeMap<DocPath, Option<i64>> {
        &self.reads
    }

    pub(crate) fn scans(&self) -> &BTreeMap<String, Vec<(String, i64)>> {
        &self.scans
    }

    pub(crate) fn writes(&self) -> &[(DocPath, Write)] {
        &self.writes
    }
}
