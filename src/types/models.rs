use chrono::{DateTime, Utc};
use serde::ser::Error as _;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::{DocPath, Document, Fields};

/// Collection holding one document per group, keyed by group id.
pub const GROUPS: &str = "groups";
/// Collection holding one claim per canonical key.
pub const GROUP_NAMES: &str = "group_names";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct GroupFields {
    name: String,
    key: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Group {
    #[must_use]
    pub fn path(id: &str) -> DocPath {
        DocPath::new(GROUPS, id)
    }

    pub fn from_document(doc: &Document) -> Result<Self> {
        let fields: GroupFields = doc.decode()?;
        Ok(Self {
            id: doc.path.id.clone(),
            name: fields.name,
            key: fields.key,
            created_at: fields.created_at,
            updated_at: fields.updated_at,
        })
    }

    pub fn fields(&self) -> Result<Fields> {
        to_fields(&GroupFields {
            name: self.name.clone(),
            key: self.key.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Partial group update applied with merge on rename.
#[derive(Serialize)]
pub struct GroupRename<'a> {
    pub name: &'a str,
    pub key: &'a str,
    pub updated_at: DateTime<Utc>,
}

impl GroupRename<'_> {
    pub fn fields(&self) -> Result<Fields> {
        to_fields(self)
    }
}

/// Asserts that a canonical key belongs to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameClaim {
    #[serde(skip)]
    pub key: String,
    pub group_id: String,
}

impl NameClaim {
    #[must_use]
    pub fn path(key: &str) -> DocPath {
        DocPath::new(GROUP_NAMES, key)
    }

    pub fn from_document(doc: &Document) -> Result<Self> {
        let mut claim: Self = doc.decode()?;
        claim.key = doc.path.id.clone();
        Ok(claim)
    }

    pub fn fields(&self) -> Result<Fields> {
        to_fields(self)
    }
}

fn to_fields<T: Serialize>(value: &T) -> Result<Fields> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(Error::Json(serde_json::Error::custom(format!(
            "document fields must be an object, got {other}"
        )))),
    }
}
