//! Group existence guard.
//!
//! Whoever holds a group id keeps watching that group's document. Once the
//! document is gone the id is dead: the session forgets it and the caller goes
//! back to creating or joining a group.

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::store::{DocumentStore, Snapshot, Subscription};
use crate::types::Group;

#[derive(Debug, Clone, PartialEq)]
pub enum GroupEvent {
    Updated(Group),
    Removed,
}

fn event(snapshot: Snapshot) -> Result<GroupEvent> {
    match snapshot {
        Some(doc) => Ok(GroupEvent::Updated(Group::from_document(&doc)?)),
        None => Ok(GroupEvent::Removed),
    }
}

/// Typed live view of one group. Dropping it unsubscribes.
pub struct GroupWatch {
    sub: Subscription,
}

impl GroupWatch {
    pub fn new(store: &dyn DocumentStore, group_id: &str) -> Result<Self> {
        let sub = store.subscribe(&Group::path(group_id))?;
        Ok(Self { sub })
    }

    pub fn current(&self) -> Result<GroupEvent> {
        event(self.sub.current())
    }

    /// Next change to the group; `None` when the store stops delivering.
    pub async fn next(&mut self) -> Option<Result<GroupEvent>> {
        self.sub.next().await.map(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardExit {
    /// The group was deleted and the session no longer points at it.
    Removed,
    /// Change delivery stopped; the session is left as is.
    Disconnected,
}

/// One-shot check that the session's group still exists.
///
/// Clears the session's group id and returns `None` if it does not.
pub fn check_session(
    store: &dyn DocumentStore,
    session: &mut crate::session::Session,
) -> Result<Option<Group>> {
    let Some(group_id) = session.group_id().map(str::to_string) else {
        return Ok(None);
    };

    match crate::groups::get(store, &group_id)? {
        Some(group) => Ok(Some(group)),
        None => {
            warn!("Group {} no longer exists, clearing session", group_id);
            session.clear_group_id()?;
            Ok(None)
        }
    }
}

/// Watches the session's group until it is deleted, reporting every other
/// change through `on_update`.
pub async fn guard_session<F>(
    store: &dyn DocumentStore,
    session: &mut crate::session::Session,
    mut on_update: F,
) -> Result<GuardExit>
where
    F: FnMut(&Group),
{
    let group_id = session.group_id().ok_or(Error::NotFound)?.to_string();
    let mut watch = GroupWatch::new(store, &group_id)?;

    let mut next = Some(watch.current());
    while let Some(event) = next {
        match event? {
            GroupEvent::Updated(group) => on_update(&group),
            GroupEvent::Removed => {
                info!("Group {} was removed, clearing session", group_id);
                session.clear_group_id()?;
                return Ok(GuardExit::Removed);
            }
        }
        next = watch.next().await;
    }

    warn!("Stopped receiving changes for group {}", group_id);
    Ok(GuardExit::Disconnected)
}
