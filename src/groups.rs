//! Create, join and rename groups by human-readable name.
//!
//! A group's canonical key is claimed through a document in the
//! `group_names` collection. Create and rename check and move claims inside
//! one atomic transaction, so two callers racing for the same key cannot both
//! win: the loser's commit fails validation, its body re-runs, and it sees
//! the winner's claim.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::names::{display_name, normalize};
use crate::store::{DocumentStore, atomically};
use crate::types::{GROUP_NAMES, GROUPS, Group, GroupRename, NameClaim};

/// Validated display name and its canonical key.
fn parse_name(text: &str) -> Result<(String, String)> {
    let key = normalize(text);
    if key.is_empty() {
        return Err(Error::InvalidName);
    }
    let name = display_name(text).ok_or(Error::InvalidName)?;
    Ok((name, key))
}

/// Claims `name` for a new group and returns the group's id.
pub fn create(store: &dyn DocumentStore, name: &str) -> Result<String> {
    let (name, key) = parse_name(name)?;
    let claim_path = NameClaim::path(&key);

    let id = atomically(store, |tx| {
        if tx.get(&claim_path)?.is_some() {
            return Err(Error::NameTaken);
        }

        let now = Utc::now();
        let group = Group {
            id: Uuid::new_v4().to_string(),
            name: name.clone(),
            key: key.clone(),
            created_at: now,
            updated_at: now,
        };
        let claim = NameClaim {
            key: key.clone(),
            group_id: group.id.clone(),
        };

        tx.set(&Group::path(&group.id), group.fields()?, false);
        tx.set(&claim_path, claim.fields()?, false);
        Ok(group.id)
    })
    .map_err(Error::into_protocol)?;

    info!("Created group '{}' ({})", key, id);
    Ok(id)
}

/// Resolves `name` to the id of the group currently claiming it.
pub fn join(store: &dyn DocumentStore, name: &str) -> Result<String> {
    let (_, key) = parse_name(name)?;

    let doc = store
        .get(&NameClaim::path(&key))
        .map_err(Error::into_protocol)?
        .ok_or(Error::NotFound)?;
    let claim = NameClaim::from_document(&doc).map_err(Error::into_protocol)?;

    info!("Resolved group '{}' to {}", key, claim.group_id);
    Ok(claim.group_id)
}

/// Renames a group, moving its claim to the new key.
///
/// The new claim is written before the old one is deleted, and the old one is
/// only deleted if it still points at this group.
pub fn rename(store: &dyn DocumentStore, group_id: &str, new_name: &str) -> Result<Group> {
    let (new_name, new_key) = parse_name(new_name)?;
    let group_path = Group::path(group_id);
    let new_claim_path = NameClaim::path(&new_key);

    let group = atomically(store, |tx| {
        let doc = tx.get(&group_path)?.ok_or(Error::NotFound)?;
        let mut group = Group::from_document(&doc)?;

        if let Some(doc) = tx.get(&new_claim_path)? {
            if NameClaim::from_document(&doc)?.group_id != group_id {
                return Err(Error::NameTaken);
            }
        }

        let mut stale_claim = None;
        if group.key != new_key {
            let old_path = NameClaim::path(&group.key);
            if let Some(doc) = tx.get(&old_path)? {
                if NameClaim::from_document(&doc)?.group_id == group_id {
                    stale_claim = Some(old_path);
                }
            }
        }

        let now = Utc::now();
        let update = GroupRename {
            name: &new_name,
            key: &new_key,
            updated_at: now,
        };
        let claim = NameClaim {
            key: new_key.clone(),
            group_id: group_id.to_string(),
        };

        tx.set(&group_path, update.fields()?, true);
        tx.set(&new_claim_path, claim.fields()?, true);
        if let Some(old_path) = stale_claim {
            tx.delete(&old_path);
        }

        group.name = new_name.clone();
        group.key = new_key.clone();
        group.updated_at = now;
        Ok(group)
    })
    .map_err(Error::into_protocol)?;

    info!("Renamed group {} to '{}'", group_id, group.key);
    Ok(group)
}

pub fn get(store: &dyn DocumentStore, group_id: &str) -> Result<Option<Group>> {
    store
        .get(&Group::path(group_id))
        .and_then(|doc| doc.as_ref().map(Group::from_document).transpose())
        .map_err(Error::into_protocol)
}

pub fn list(store: &dyn DocumentStore) -> Result<Vec<Group>> {
    store
        .list(GROUPS)?
        .iter()
        .map(Group::from_document)
        .collect()
}

pub fn claims(store: &dyn DocumentStore) -> Result<Vec<NameClaim>> {
    store
        .list(GROUP_NAMES)?
        .iter()
        .map(NameClaim::from_document)
        .collect()
}

/// Deletes a group together with every claim pointing at it.
///
/// This is an administrative action; the lifecycle operations never delete
/// groups. Returns `false` if there was nothing to delete.
pub fn remove(store: &dyn DocumentStore, group_id: &str) -> Result<bool> {
    let group_path = Group::path(group_id);

    let removed = atomically(store, |tx| {
        let group_exists = tx.get(&group_path)?.is_some();

        let mut owned = Vec::new();
        for doc in tx.list(GROUP_NAMES)? {
            if NameClaim::from_document(&doc)?.group_id == group_id {
                owned.push(doc.path);
            }
        }

        if group_exists {
            tx.delete(&group_path);
        }
        for path in &owned {
            tx.delete(path);
        }
        Ok(group_exists || !owned.is_empty())
    })?;

    if removed {
        info!("Removed group {}", group_id);
    }
    Ok(removed)
}
